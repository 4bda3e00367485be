use anyhow::{bail, Context, Result};
use halo_core::{LifecycleState, Map, Value};
use halo_dom::Document;
use halo_runtime::{Config, Instance, Options};
use halo_template::{parse_markup, pieces, Expression, MarkupNode, Piece};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const HOST_PAGE: &str = r#"<div id="app"></div>"#;
const HOST_SELECTOR: &str = "#app";

/// Install the global subscriber. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Default, Clone)]
pub struct RenderArgs {
    pub data: Option<PathBuf>,
    /// `path=json` writes applied in order after mounting.
    pub sets: Vec<String>,
    /// Treat the input as a whole page and mount at this selector.
    pub selector: Option<String>,
    pub config: Option<PathBuf>,
    pub prefix: Option<String>,
    pub silent: bool,
}

/// Mount `input` and return the rendered markup after every `--set`.
pub fn render_cmd(input: &Path, args: &RenderArgs) -> Result<String> {
    let src =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let config = load_config(args)?;
    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => Map::new(),
    };

    let (document, template, selector) = match &args.selector {
        Some(sel) => {
            let doc = Document::parse(&src)
                .with_context(|| format!("failed to parse {}", input.display()))?;
            (doc, None, sel.clone())
        }
        None => (
            Document::parse(HOST_PAGE)?,
            Some(src),
            HOST_SELECTOR.to_string(),
        ),
    };

    let mut opts = Options::new()
        .document(document)
        .el(selector.as_str())
        .config(config);
    opts.data = data;
    if let Some(t) = template {
        opts = opts.template(t);
    }
    let mut vm = Instance::new(opts);
    if vm.state() != LifecycleState::Mounted {
        bail!("could not mount at `{selector}`");
    }

    for raw in &args.sets {
        let (path, value) = parse_assignment(raw)?;
        debug!(path, "applying --set");
        vm.set(path, value);
    }

    Ok(match &args.selector {
        Some(_) => {
            let doc = vm.document();
            doc.inner_html(doc.body())
        }
        None => vm.html(),
    })
}

fn load_config(args: &RenderArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let src = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Config::from_json(&src).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(prefix) = &args.prefix {
        config.attribute_prefix = prefix.clone();
    }
    config.silent |= args.silent;
    Ok(config)
}

fn load_data(path: &Path) -> Result<Map<String, Value>> {
    let src =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&src)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("{} must contain a JSON object", path.display()),
    }
}

/// `path=value`; the value is JSON when it parses, else a plain string.
pub fn parse_assignment(raw: &str) -> Result<(&str, Value)> {
    let Some((path, value)) = raw.split_once('=') else {
        bail!("expected path=value, got `{raw}`");
    };
    let path = path.trim();
    if path.is_empty() {
        bail!("empty path in `{raw}`");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((path, value))
}

/// A problem found by `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub location: String,
    pub message: String,
}

/// Directives whose value is an expression even without `{{ }}`.
const EXPRESSION_DIRECTIVES: &[&str] = &["if", "show", "model"];

/// Parse the markup and every expression in it.
pub fn check_cmd(input: &Path, prefix: &str) -> Result<Vec<Problem>> {
    let src =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let nodes = match parse_markup(&src) {
        Ok(nodes) => nodes,
        Err(err) => {
            return Ok(vec![Problem {
                location: input.display().to_string(),
                message: err.to_string(),
            }])
        }
    };
    let mut problems = Vec::new();
    for node in &nodes {
        check_node(node, prefix, &mut problems);
    }
    Ok(problems)
}

fn check_node(node: &MarkupNode, prefix: &str, out: &mut Vec<Problem>) {
    match node {
        MarkupNode::Text(t) => check_markers(t, "text", out),
        MarkupNode::Element {
            tag,
            attrs,
            children,
            ..
        } => {
            for attr in attrs {
                let value = attr.value.as_deref().unwrap_or("");
                let location = format!("<{tag} {}>", attr.name);
                check_markers(value, &location, out);
                let Some(name) = attr.name.strip_prefix(prefix) else {
                    continue;
                };
                let expr = if EXPRESSION_DIRECTIVES.contains(&name) && !value.contains("{{") {
                    Some(value)
                } else if name == "for" {
                    match value.split_once(" in ") {
                        Some((_, source)) => Some(source.trim()),
                        None => {
                            out.push(Problem {
                                location: location.clone(),
                                message: format!("expected `alias in expr`, got `{value}`"),
                            });
                            None
                        }
                    }
                } else {
                    None
                };
                if let Some(expr) = expr {
                    if let Err(err) = Expression::parse(expr) {
                        out.push(Problem {
                            location,
                            message: err.to_string(),
                        });
                    }
                }
            }
            for child in children {
                check_node(child, prefix, out);
            }
        }
    }
}

fn check_markers(template: &str, location: &str, out: &mut Vec<Problem>) {
    for piece in pieces(template) {
        if let Piece::Marker(body) = piece {
            if body.is_empty() {
                continue;
            }
            if let Err(err) = Expression::parse(body) {
                out.push(Problem {
                    location: location.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
}
