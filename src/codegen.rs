// Code generation — The generate pass over every node kind
//
// Each arm assembles GLSL text from its operands' generated snippets.
// Compound expressions come back parenthesized, so precedence survives
// plain string concatenation. Operands are built through
// `NodeBuilder::build`, which memoizes per (structural hash, output
// type) — generating a node twice is free and side effects (function
// declarations, flow statements) happen once.
//
// Known numerical transforms (color spaces, tone curves, normal
// perturbation) are emitted as library functions at most once per
// compilation unit, then invoked by name.

use crate::builder::NodeBuilder;
use crate::error::{Error, ErrorKind, Result};
use crate::node::{FunctionBody, Node, NodeId};
use crate::types::{ShaderStage, ShaderType};

impl NodeBuilder<'_> {
    /// Produce the snippet for one node at the requested output type.
    /// Called by `build` on a cache miss; never call this directly.
    pub(crate) fn generate(&mut self, id: NodeId, output: ShaderType) -> Result<String> {
        let node = self.graph.node(id);
        match node {
            Node::Constant { value } => {
                let code = value.to_string();
                Ok(self.fit(code, value.natural_type(), output))
            }

            Node::Operator { op, left, right } => {
                let l = self.build(*left, ShaderType::Auto)?;
                let r = self.build(*right, ShaderType::Auto)?;
                let code = format!("({l} {op} {r})");
                let natural = self.graph.infer_type(id);
                Ok(self.fit(code, natural, output))
            }

            Node::Math { method, args } => {
                let built: Vec<String> = args
                    .iter()
                    .map(|a| self.build(*a, ShaderType::Auto))
                    .collect::<Result<_>>()?;
                let code = math_snippet(method, &built);
                let natural = self.graph.infer_type(id);
                Ok(self.fit(code, natural, output))
            }

            Node::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let branch_ty = if output == ShaderType::Auto {
                    self.graph.infer_type(*if_true)
                } else {
                    output
                };
                let cond = self.build(*condition, ShaderType::Bool)?;
                let t = self.build(*if_true, branch_ty)?;
                let f = self.build(*if_false, branch_ty)?;
                Ok(format!("({cond} ? {t} : {f})"))
            }

            Node::Select {
                condition,
                if_true,
                if_false,
            } => {
                let out_ty = if output == ShaderType::Auto {
                    self.graph.infer_type(*if_true)
                } else {
                    output
                };
                let cond = self.build(*condition, ShaderType::Bool)?;
                let t = self.build(*if_true, out_ty)?;
                let f = self.build(*if_false, out_ty)?;
                // Per-component selection via a float mask, so vector
                // conditions select lane-wise instead of collapsing to
                // one branch.
                let mask = out_ty.float_counterpart();
                Ok(format!("mix({f}, {t}, {mask}({cond}))"))
            }

            Node::Code { template, inputs } => {
                let mut code = template.clone();
                for (name, input) in inputs {
                    let built = self.build(*input, ShaderType::Auto)?;
                    code = code.replace(&format!("${{{name}}}"), &built);
                }
                Ok(code)
            }

            Node::Expression {
                template,
                inputs,
                output_type,
            } => {
                let mut code = template.clone();
                for (name, input) in inputs {
                    let built = self.build(*input, *output_type)?;
                    code = code.replace(&format!("${{{name}}}"), &built);
                }
                let code = format!("({code})");
                Ok(self.fit(code, *output_type, output))
            }

            Node::Function {
                name,
                parameters,
                return_type,
                body,
            } => {
                if !self.is_function_declared(name) {
                    let params_src = parameters
                        .iter()
                        .map(|p| format!("{} {}", p.ty, p.name))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let body_src = match body {
                        FunctionBody::Expr(expr) => {
                            let code = self.build(*expr, *return_type)?;
                            format!("    return {code};")
                        }
                        FunctionBody::Source(src) => {
                            let trimmed = src.trim();
                            if !trimmed.contains("return") && !trimmed.contains(';') {
                                // A bare expression body gets an implicit
                                // return.
                                format!("    return ({trimmed});")
                            } else {
                                trimmed
                                    .lines()
                                    .map(|line| format!("    {}", line.trim()))
                                    .collect::<Vec<_>>()
                                    .join("\n")
                            }
                        }
                    };
                    let source = format!("{return_type} {name}({params_src}) {{\n{body_src}\n}}");
                    self.declare_function(name, source);
                }
                Ok(name.clone())
            }

            Node::Parameter { name, ty } => {
                let code = name.clone();
                Ok(self.fit(code, *ty, output))
            }

            Node::FunctionCall { function, args } => {
                // Building the callee declares it (once) and yields its
                // name.
                let fname = self.build(*function, ShaderType::Auto)?;
                let Node::Function {
                    parameters,
                    return_type,
                    ..
                } = self.graph.node(*function)
                else {
                    return Err(Error::node(ErrorKind::NotAFunction, "FunctionCall"));
                };
                let mut built = Vec::with_capacity(parameters.len());
                for (arg, param) in args.iter().zip(parameters) {
                    built.push(self.build(*arg, param.ty)?);
                }
                // Optional parameters beyond the supplied arguments fall
                // back to their defaults.
                for param in parameters.iter().skip(args.len()) {
                    if let Some(default) = param.default_value {
                        built.push(default.to_string());
                    }
                }
                let code = format!("{fname}({})", built.join(", "));
                Ok(self.fit(code, *return_type, output))
            }

            Node::Convert { target, input } => {
                if *target == ShaderType::Auto {
                    return self.build(*input, ShaderType::Auto);
                }
                let inner = self.build(*input, ShaderType::Auto)?;
                let code = format!("{target}({inner})");
                Ok(self.fit(code, *target, output))
            }

            Node::Join { parts } => {
                let target = if output.vector_dim().is_some() {
                    output
                } else {
                    self.graph.infer_type(id)
                };
                let built: Vec<String> = parts
                    .iter()
                    .map(|p| self.build(*p, ShaderType::Auto))
                    .collect::<Result<_>>()?;
                let code = format!("{target}({})", built.join(", "));
                Ok(self.fit(code, target, output))
            }

            Node::Swizzle { input, components } => {
                let inner = self.build(*input, ShaderType::Auto)?;
                let code = format!("{inner}.{components}");
                let natural = ShaderType::float_vec(components.len());
                Ok(self.fit(code, natural, output))
            }

            Node::Uniform { name, ty } => {
                // Normally registered during analyze; re-registering the
                // same name/type is a no-op, so direct generation works
                // too.
                let (name, ty) = (name.clone(), *ty);
                self.register_uniform(&name, ty)?;
                Ok(self.fit(name, ty, output))
            }

            Node::Compute {
                workgroup_size,
                dispatch_count,
                body,
            } => {
                let (size, count, body) = (*workgroup_size, *dispatch_count, *body);
                if self.workgroup.is_none() {
                    self.workgroup = Some((size, count));
                    self.declarations.push(format!(
                        "layout(local_size_x = {}, local_size_y = {}, local_size_z = {}) in;",
                        size[0], size[1], size[2]
                    ));
                }
                // The one construct that changes the stage: compute for
                // the body, restored on exit (also on error).
                let previous = self.stage;
                self.stage = ShaderStage::Compute;
                let built = self.build(body, ShaderType::Auto);
                self.stage = previous;
                let body_code = built?;
                if !body_code.is_empty() {
                    self.push_flow(format!("{body_code};"));
                }
                Ok(String::new())
            }

            Node::ComputeBuiltin { builtin } => {
                self.require_stage(ShaderStage::Compute, "ComputeBuiltin")?;
                let code = match builtin.as_str() {
                    "globalInvocationId" => "gl_GlobalInvocationID",
                    "localInvocationId" => "gl_LocalInvocationID",
                    "localInvocationIndex" => "gl_LocalInvocationIndex",
                    "workgroupId" => "gl_WorkGroupID",
                    _ => "gl_NumWorkGroups",
                };
                let natural = self.graph.infer_type(id);
                Ok(self.fit(code.to_string(), natural, output))
            }

            Node::AtomicFunction {
                method,
                pointer,
                value,
                compare,
            } => {
                self.require_stage(ShaderStage::Compute, "AtomicFunction")?;
                let ptr = self.build(*pointer, ShaderType::Auto)?;
                let val = self.build(*value, ShaderType::Auto)?;
                let code = match method.as_str() {
                    // GLSL has no atomicSub; negate through atomicAdd.
                    "sub" => format!("atomicAdd({ptr}, -({val}))"),
                    "compSwap" => {
                        // Guaranteed by the constructor, but deserialized
                        // graphs skip it.
                        let compare = compare.ok_or_else(|| {
                            Error::node(ErrorKind::MissingCompareOperand, "AtomicFunction")
                        })?;
                        let cmp = self.build(compare, ShaderType::Auto)?;
                        format!("atomicCompSwap({ptr}, {cmp}, {val})")
                    }
                    other => {
                        let mut name = String::from("atomic");
                        let mut chars = other.chars();
                        if let Some(first) = chars.next() {
                            name.push(first.to_ascii_uppercase());
                            name.extend(chars);
                        }
                        format!("{name}({ptr}, {val})")
                    }
                };
                Ok(code)
            }

            Node::Barrier { scope } => {
                self.require_stage(ShaderStage::Compute, "Barrier")?;
                let stmt = match scope.as_str() {
                    "workgroup" => "barrier();",
                    "storage" => "memoryBarrierBuffer();",
                    _ => "memoryBarrierImage();",
                };
                self.push_flow(stmt.to_string());
                Ok(String::new())
            }

            Node::SubgroupFunction { method, value } => {
                self.require_stage(ShaderStage::Compute, "SubgroupFunction")?;
                let mut name = String::from("subgroup");
                let mut chars = method.chars();
                if let Some(first) = chars.next() {
                    name.push(first.to_ascii_uppercase());
                    name.extend(chars);
                }
                let code = match value {
                    Some(v) => {
                        let built = self.build(*v, ShaderType::Auto)?;
                        format!("{name}({built})")
                    }
                    None => format!("{name}()"),
                };
                Ok(code)
            }

            Node::WorkgroupArray {
                name,
                element_type,
                count,
            } => {
                self.require_stage(ShaderStage::Compute, "WorkgroupArray")?;
                let decl = format!("shared {element_type} {name}[{count}];");
                let name = name.clone();
                self.declare_output(&name, decl);
                Ok(name)
            }

            Node::ColorSpace { from, to, input } => {
                let color = self.build(*input, ShaderType::Vec3)?;
                let code = match (from.as_str(), to.as_str()) {
                    ("srgb", "linear") => {
                        self.declare_function("srgbToLinear", SRGB_TO_LINEAR.to_string());
                        format!("srgbToLinear({color})")
                    }
                    ("linear", "srgb") => {
                        self.declare_function("linearToSrgb", LINEAR_TO_SRGB.to_string());
                        format!("linearToSrgb({color})")
                    }
                    ("display-p3", "linear") => {
                        self.declare_function("srgbToLinear", SRGB_TO_LINEAR.to_string());
                        self.declare_function(
                            "displayP3ToLinearSrgb",
                            DISPLAY_P3_TO_LINEAR_SRGB.to_string(),
                        );
                        format!("displayP3ToLinearSrgb({color})")
                    }
                    ("linear", "display-p3") => {
                        self.declare_function("linearToSrgb", LINEAR_TO_SRGB.to_string());
                        self.declare_function(
                            "linearSrgbToDisplayP3",
                            LINEAR_SRGB_TO_DISPLAY_P3.to_string(),
                        );
                        format!("linearSrgbToDisplayP3({color})")
                    }
                    _ => {
                        // Unsupported pairs pass through, visibly.
                        format!("/* unsupported color space conversion: {from} to {to} */ {color}")
                    }
                };
                Ok(self.fit(code, ShaderType::Vec3, output))
            }

            Node::ToneMapping {
                mapping,
                exposure,
                input,
            } => {
                let exp = self.build(*exposure, ShaderType::Float)?;
                let color = self.build(*input, ShaderType::Vec3)?;
                let code = match mapping.as_str() {
                    "reinhard" => {
                        self.declare_function("reinhardToneMapping", REINHARD.to_string());
                        format!("reinhardToneMapping({color}, {exp})")
                    }
                    "cineon" => {
                        self.declare_function("cineonToneMapping", CINEON.to_string());
                        format!("cineonToneMapping({color}, {exp})")
                    }
                    "aces" => {
                        self.declare_function("acesFilmicToneMapping", ACES_FILMIC.to_string());
                        format!("acesFilmicToneMapping({color}, {exp})")
                    }
                    "agx" => {
                        self.declare_function("agxToneMapping", AGX.to_string());
                        format!("agxToneMapping({color}, {exp})")
                    }
                    "neutral" => {
                        self.declare_function("neutralToneMapping", NEUTRAL.to_string());
                        format!("neutralToneMapping({color}, {exp})")
                    }
                    _ => format!("/* unsupported tone mapping: {mapping} */ {color}"),
                };
                Ok(self.fit(code, ShaderType::Vec3, output))
            }

            Node::NormalMap { sample, scale } => {
                self.declare_function("perturbNormalTangent", PERTURB_NORMAL_TANGENT.to_string());
                let sample = self.build(*sample, ShaderType::Vec3)?;
                let scale = match scale {
                    Some(s) => self.build(*s, ShaderType::Float)?,
                    None => "1.0".to_string(),
                };
                let map_n = format!("({sample} * 2.0 - 1.0)");
                let code = format!(
                    "perturbNormalTangent(vNormal, vViewPosition, vUv, vec3({map_n}.xy * {scale}, {map_n}.z))"
                );
                Ok(self.fit(code, ShaderType::Vec3, output))
            }

            Node::BumpMap { sample, scale } => {
                self.declare_function("perturbNormalBump", PERTURB_NORMAL_BUMP.to_string());
                let height = self.build(*sample, ShaderType::Float)?;
                let scale = self.build(*scale, ShaderType::Float)?;
                let code = format!("perturbNormalBump(vNormal, vViewPosition, {height} * {scale})");
                Ok(self.fit(code, ShaderType::Vec3, output))
            }

            Node::Screen { value } => {
                let code = match value.as_str() {
                    "coordinate" => "gl_FragCoord.xy".to_string(),
                    "uv" => {
                        self.register_uniform("screenSize", ShaderType::Vec2)?;
                        "(gl_FragCoord.xy / screenSize)".to_string()
                    }
                    _ => {
                        self.register_uniform("screenSize", ShaderType::Vec2)?;
                        "screenSize".to_string()
                    }
                };
                Ok(self.fit(code, ShaderType::Vec2, output))
            }

            Node::RenderOutput { color } => {
                let color = self.build(*color, ShaderType::Vec4)?;
                self.declare_output(
                    "fragColor",
                    "layout(location = 0) out vec4 fragColor;".to_string(),
                );
                self.push_flow(format!("fragColor = {color};"));
                Ok("fragColor".to_string())
            }

            Node::ViewportTexture { uv } => {
                self.register_uniform("viewportTexture", ShaderType::Sampler2D)?;
                let uv = self.build(*uv, ShaderType::Vec2)?;
                let code = format!("texture(viewportTexture, {uv})");
                Ok(self.fit(code, ShaderType::Vec4, output))
            }
        }
    }

    /// Wrap `code` in a constructor cast when the natural type of the
    /// snippet differs from the requested output type. Auto on either
    /// side means "leave as is".
    fn fit(&self, code: String, natural: ShaderType, requested: ShaderType) -> String {
        if requested == ShaderType::Auto
            || natural == ShaderType::Auto
            || natural == requested
        {
            code
        } else {
            format!("{requested}({code})")
        }
    }
}

/// Render a math-method call. Comparison and logical methods are infix;
/// a handful of names are aliases for expressions GLSL spells
/// differently.
fn math_snippet(method: &str, args: &[String]) -> String {
    match (method, args) {
        ("negate", [x]) => format!("(-{x})"),
        ("oneMinus", [x]) => format!("(1.0 - {x})"),
        ("saturate", [x]) => format!("clamp({x}, 0.0, 1.0)"),
        ("not", [x]) => format!("(!{x})"),
        ("atan2", [y, x]) => format!("atan({y}, {x})"),
        ("equal", [a, b]) => format!("({a} == {b})"),
        ("notEqual", [a, b]) => format!("({a} != {b})"),
        ("lessThan", [a, b]) => format!("({a} < {b})"),
        ("lessThanEqual", [a, b]) => format!("({a} <= {b})"),
        ("greaterThan", [a, b]) => format!("({a} > {b})"),
        ("greaterThanEqual", [a, b]) => format!("({a} >= {b})"),
        ("and", [a, b]) => format!("({a} && {b})"),
        ("or", [a, b]) => format!("({a} || {b})"),
        _ => format!("{method}({})", args.join(", ")),
    }
}

// Library functions, emitted at most once per compilation unit.

const SRGB_TO_LINEAR: &str = "\
vec3 srgbToLinear(vec3 color) {
    return mix(pow(color * 0.9478672986 + vec3(0.0521327014), vec3(2.4)), color * 0.0773993808, vec3(lessThanEqual(color, vec3(0.04045))));
}";

const LINEAR_TO_SRGB: &str = "\
vec3 linearToSrgb(vec3 color) {
    return mix(pow(color, vec3(0.41666)) * 1.055 - vec3(0.055), color * 12.92, vec3(lessThanEqual(color, vec3(0.0031308))));
}";

const DISPLAY_P3_TO_LINEAR_SRGB: &str = "\
vec3 displayP3ToLinearSrgb(vec3 color) {
    const mat3 p3ToSrgb = mat3(
        1.2249401, -0.0420569, -0.0196376,
        -0.2249404, 1.0420571, -0.0786361,
        0.0000000, 0.0000000, 1.0982735
    );
    return p3ToSrgb * srgbToLinear(color);
}";

const LINEAR_SRGB_TO_DISPLAY_P3: &str = "\
vec3 linearSrgbToDisplayP3(vec3 color) {
    const mat3 srgbToP3 = mat3(
        0.8224621, 0.0331941, 0.0170827,
        0.1775380, 0.9668058, 0.0723974,
        0.0000000, 0.0000000, 0.9105199
    );
    return linearToSrgb(srgbToP3 * color);
}";

const REINHARD: &str = "\
vec3 reinhardToneMapping(vec3 color, float exposure) {
    color *= exposure;
    return clamp(color / (vec3(1.0) + color), 0.0, 1.0);
}";

const CINEON: &str = "\
vec3 cineonToneMapping(vec3 color, float exposure) {
    color *= exposure;
    color = max(vec3(0.0), color - 0.004);
    return pow((color * (6.2 * color + 0.5)) / (color * (6.2 * color + 1.7) + 0.06), vec3(2.2));
}";

const ACES_FILMIC: &str = "\
vec3 rrtAndOdtFit(vec3 v) {
    vec3 a = v * (v + 0.0245786) - 0.000090537;
    vec3 b = v * (0.983729 * v + 0.4329510) + 0.238081;
    return a / b;
}

vec3 acesFilmicToneMapping(vec3 color, float exposure) {
    const mat3 acesInput = mat3(
        0.59719, 0.07600, 0.02840,
        0.35458, 0.90834, 0.13383,
        0.04823, 0.01566, 0.83777
    );
    const mat3 acesOutput = mat3(
        1.60475, -0.10208, -0.00327,
        -0.53108, 1.10813, -0.07276,
        -0.07367, -0.00605, 1.07602
    );
    color *= exposure / 0.6;
    color = acesInput * color;
    color = rrtAndOdtFit(color);
    color = acesOutput * color;
    return clamp(color, 0.0, 1.0);
}";

const AGX: &str = "\
vec3 agxContrastApprox(vec3 x) {
    vec3 x2 = x * x;
    vec3 x4 = x2 * x2;
    return 15.5 * x4 * x2 - 40.14 * x4 * x + 31.96 * x4 - 6.868 * x2 * x + 0.4298 * x2 + 0.1191 * x - 0.00232;
}

vec3 agxToneMapping(vec3 color, float exposure) {
    const mat3 agxInset = mat3(
        0.856627153315983, 0.137318972929847, 0.11189821299995,
        0.0951212405381588, 0.761241990602591, 0.0767994186031903,
        0.0482516061458583, 0.101439036467562, 0.811302368396859
    );
    const mat3 agxOutset = mat3(
        1.1271005818144368, -0.1413297634984383, -0.14132976349843826,
        -0.11060664309660323, 1.157823702216272, -0.11060664309660294,
        -0.016493938717834573, -0.016493938717834257, 1.2519364065950405
    );
    const float agxMinEv = -12.47393;
    const float agxMaxEv = 4.026069;
    color *= exposure;
    color = agxInset * color;
    color = max(color, vec3(1e-10));
    color = clamp(log2(color), agxMinEv, agxMaxEv);
    color = (color - agxMinEv) / (agxMaxEv - agxMinEv);
    color = agxContrastApprox(color);
    color = agxOutset * color;
    return clamp(color, 0.0, 1.0);
}";

const NEUTRAL: &str = "\
vec3 neutralToneMapping(vec3 color, float exposure) {
    const float startCompression = 0.8 - 0.04;
    const float desaturation = 0.15;
    color *= exposure;
    float x = min(color.r, min(color.g, color.b));
    float offset = x < 0.08 ? x - 6.25 * x * x : 0.04;
    color -= offset;
    float peak = max(color.r, max(color.g, color.b));
    if (peak < startCompression) {
        return color;
    }
    float d = 1.0 - startCompression;
    float newPeak = 1.0 - d * d / (peak + d - startCompression);
    color *= newPeak / peak;
    float g = 1.0 - 1.0 / (desaturation * (peak - newPeak) + 1.0);
    return mix(color, vec3(newPeak), g);
}";

const PERTURB_NORMAL_TANGENT: &str = "\
vec3 perturbNormalTangent(vec3 surfNormal, vec3 viewPos, vec2 uv, vec3 mapN) {
    vec3 q0 = dFdx(viewPos);
    vec3 q1 = dFdy(viewPos);
    vec2 st0 = dFdx(uv);
    vec2 st1 = dFdy(uv);
    vec3 n = normalize(surfNormal);
    vec3 q1perp = cross(q1, n);
    vec3 q0perp = cross(n, q0);
    vec3 t = q1perp * st0.x + q0perp * st1.x;
    vec3 b = q1perp * st0.y + q0perp * st1.y;
    float det = max(dot(t, t), dot(b, b));
    float scale = (det == 0.0) ? 0.0 : inversesqrt(det);
    return normalize(t * (mapN.x * scale) + b * (mapN.y * scale) + n * mapN.z);
}";

const PERTURB_NORMAL_BUMP: &str = "\
vec3 perturbNormalBump(vec3 surfNormal, vec3 viewPos, float height) {
    vec3 sigmaX = dFdx(viewPos);
    vec3 sigmaY = dFdy(viewPos);
    vec3 n = normalize(surfNormal);
    vec3 r1 = cross(sigmaY, n);
    vec3 r2 = cross(n, sigmaX);
    float det = dot(sigmaX, r1);
    vec2 dHdxy = vec2(dFdx(height), dFdy(height));
    vec3 grad = sign(det) * (dHdxy.x * r1 + dHdxy.y * r2);
    return normalize(abs(det) * n - grad);
}";
