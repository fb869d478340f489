// Shader types and stages
//
// ShaderType is the closed set of value types that can flow through the
// node graph. `Auto` means "infer from context" and is the type every
// operand is built at during the analyze pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three pipeline stages a shader can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
            ShaderStage::Compute => write!(f, "compute"),
        }
    }
}

/// A value type in the shading language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderType {
    /// Inferred from context; never emitted as source text.
    Auto,
    Void,
    Bool,
    Int,
    Uint,
    Float,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    UVec2,
    UVec3,
    UVec4,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    SamplerCube,
}

impl fmt::Display for ShaderType {
    /// The GLSL spelling of the type.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderType::Auto => "auto",
            ShaderType::Void => "void",
            ShaderType::Bool => "bool",
            ShaderType::Int => "int",
            ShaderType::Uint => "uint",
            ShaderType::Float => "float",
            ShaderType::Vec2 => "vec2",
            ShaderType::Vec3 => "vec3",
            ShaderType::Vec4 => "vec4",
            ShaderType::IVec2 => "ivec2",
            ShaderType::IVec3 => "ivec3",
            ShaderType::IVec4 => "ivec4",
            ShaderType::UVec2 => "uvec2",
            ShaderType::UVec3 => "uvec3",
            ShaderType::UVec4 => "uvec4",
            ShaderType::BVec2 => "bvec2",
            ShaderType::BVec3 => "bvec3",
            ShaderType::BVec4 => "bvec4",
            ShaderType::Mat2 => "mat2",
            ShaderType::Mat3 => "mat3",
            ShaderType::Mat4 => "mat4",
            ShaderType::Sampler2D => "sampler2D",
            ShaderType::SamplerCube => "samplerCube",
        };
        write!(f, "{name}")
    }
}

/// Look up a shader type from its source spelling.
/// Returns None if the string is not a type name.
pub fn type_lookup(s: &str) -> Option<ShaderType> {
    let ty = match s {
        "void" => ShaderType::Void,
        "bool" => ShaderType::Bool,
        "int" => ShaderType::Int,
        "uint" => ShaderType::Uint,
        "float" => ShaderType::Float,
        "vec2" => ShaderType::Vec2,
        "vec3" => ShaderType::Vec3,
        "vec4" => ShaderType::Vec4,
        "ivec2" => ShaderType::IVec2,
        "ivec3" => ShaderType::IVec3,
        "ivec4" => ShaderType::IVec4,
        "uvec2" => ShaderType::UVec2,
        "uvec3" => ShaderType::UVec3,
        "uvec4" => ShaderType::UVec4,
        "bvec2" => ShaderType::BVec2,
        "bvec3" => ShaderType::BVec3,
        "bvec4" => ShaderType::BVec4,
        "mat2" => ShaderType::Mat2,
        "mat3" => ShaderType::Mat3,
        "mat4" => ShaderType::Mat4,
        "sampler2D" => ShaderType::Sampler2D,
        "samplerCube" => ShaderType::SamplerCube,
        _ => return None,
    };
    Some(ty)
}

/// The scalar category a type belongs to, for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Numeric,
    Boolean,
    Matrix,
    Sampler,
    Other,
}

impl ShaderType {
    /// Number of components (1 for scalars, N for vecN, N*N for matN).
    pub fn component_count(self) -> usize {
        match self {
            ShaderType::Vec2 | ShaderType::IVec2 | ShaderType::UVec2 | ShaderType::BVec2 => 2,
            ShaderType::Vec3 | ShaderType::IVec3 | ShaderType::UVec3 | ShaderType::BVec3 => 3,
            ShaderType::Vec4 | ShaderType::IVec4 | ShaderType::UVec4 | ShaderType::BVec4 => 4,
            ShaderType::Mat2 => 4,
            ShaderType::Mat3 => 9,
            ShaderType::Mat4 => 16,
            _ => 1,
        }
    }

    /// Vector dimension, or None for non-vector types.
    pub fn vector_dim(self) -> Option<usize> {
        match self {
            ShaderType::Vec2 | ShaderType::IVec2 | ShaderType::UVec2 | ShaderType::BVec2 => Some(2),
            ShaderType::Vec3 | ShaderType::IVec3 | ShaderType::UVec3 | ShaderType::BVec3 => Some(3),
            ShaderType::Vec4 | ShaderType::IVec4 | ShaderType::UVec4 | ShaderType::BVec4 => Some(4),
            _ => None,
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            ShaderType::Bool | ShaderType::Int | ShaderType::Uint | ShaderType::Float
        )
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, ShaderType::Mat2 | ShaderType::Mat3 | ShaderType::Mat4)
    }

    pub fn category(self) -> TypeCategory {
        match self {
            ShaderType::Int
            | ShaderType::Uint
            | ShaderType::Float
            | ShaderType::Vec2
            | ShaderType::Vec3
            | ShaderType::Vec4
            | ShaderType::IVec2
            | ShaderType::IVec3
            | ShaderType::IVec4
            | ShaderType::UVec2
            | ShaderType::UVec3
            | ShaderType::UVec4 => TypeCategory::Numeric,
            ShaderType::Bool | ShaderType::BVec2 | ShaderType::BVec3 | ShaderType::BVec4 => {
                TypeCategory::Boolean
            }
            ShaderType::Mat2 | ShaderType::Mat3 | ShaderType::Mat4 => TypeCategory::Matrix,
            ShaderType::Sampler2D | ShaderType::SamplerCube => TypeCategory::Sampler,
            ShaderType::Auto | ShaderType::Void => TypeCategory::Other,
        }
    }

    /// The float-family vector of the same dimension (used for selection
    /// masks and component joins). Scalars map to Float.
    pub fn float_counterpart(self) -> ShaderType {
        match self.vector_dim() {
            Some(2) => ShaderType::Vec2,
            Some(3) => ShaderType::Vec3,
            Some(4) => ShaderType::Vec4,
            _ => ShaderType::Float,
        }
    }

    /// The float-family vector with `dim` components (1 gives Float).
    pub fn float_vec(dim: usize) -> ShaderType {
        match dim {
            2 => ShaderType::Vec2,
            3 => ShaderType::Vec3,
            4 => ShaderType::Vec4,
            _ => ShaderType::Float,
        }
    }

    /// Whether an argument of type `self` can bind a parameter declared as
    /// `param`. Either side being Auto accepts anything; numeric scalars
    /// are interchangeable; vectors match by dimension within the same
    /// category family; matrices must match exactly.
    pub fn is_compatible_with(self, param: ShaderType) -> bool {
        if self == param || self == ShaderType::Auto || param == ShaderType::Auto {
            return true;
        }
        if self.is_scalar()
            && param.is_scalar()
            && self.category() == TypeCategory::Numeric
            && param.category() == TypeCategory::Numeric
        {
            return true;
        }
        match (self.vector_dim(), param.vector_dim()) {
            (Some(a), Some(b)) => a == b && self.category() == param.category(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_lookup_roundtrip() {
        for name in ["float", "vec3", "ivec2", "mat4", "sampler2D", "bvec4"] {
            let ty = type_lookup(name).unwrap();
            assert_eq!(ty.to_string(), name);
        }
        assert!(type_lookup("vec5").is_none());
    }

    #[test]
    fn test_numeric_scalars_interchangeable() {
        assert!(ShaderType::Int.is_compatible_with(ShaderType::Float));
        assert!(ShaderType::Uint.is_compatible_with(ShaderType::Int));
        assert!(!ShaderType::Bool.is_compatible_with(ShaderType::Float));
    }

    #[test]
    fn test_vector_compatibility_by_dimension() {
        assert!(ShaderType::Vec3.is_compatible_with(ShaderType::Vec3));
        assert!(!ShaderType::Vec3.is_compatible_with(ShaderType::Vec2));
        assert!(!ShaderType::Vec3.is_compatible_with(ShaderType::BVec3));
        assert!(ShaderType::IVec2.is_compatible_with(ShaderType::IVec2));
    }

    #[test]
    fn test_auto_accepts_everything() {
        assert!(ShaderType::Auto.is_compatible_with(ShaderType::Mat3));
        assert!(ShaderType::Mat3.is_compatible_with(ShaderType::Auto));
    }

    #[test]
    fn test_matrices_exact() {
        assert!(ShaderType::Mat3.is_compatible_with(ShaderType::Mat3));
        assert!(!ShaderType::Mat3.is_compatible_with(ShaderType::Mat4));
    }
}
