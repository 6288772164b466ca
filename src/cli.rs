//! CLI: form dictionary → (schema | field listing)
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use xlsform_schema::form::{FormDefinition, FormNode, NodeKind};
use xlsform_schema::mapping::DeclaredType;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert parsed form definitions (JSON form dictionaries) into JSON Schema
#[derive(Parser, Debug)]
#[command(name = "xlsform-schema", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate the draft-07 JSON Schema of the submitted data
    Schema(SchemaOut),
    /// list every named field with its resolved type and requiredness
    Fields(FieldsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer selecting the form dictionary in each document (e.g. /survey)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// output directory, one `<stem>.schema.json` per input
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// pretty-print indent width
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct FieldsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldLine {
    path: String,
    base: String,
    required: bool,
    conditional: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Source {
    fn read(&self) -> Result<String> {
        match self {
            Self::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read stdin")?;
                Ok(buf)
            }
            Self::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read source file {}", path.display())),
        }
    }

    /// File name without extension; used to name outputs in batch mode.
    fn stem(&self) -> String {
        match self {
            Self::Stdin => "stdin".to_string(),
            Self::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "form".to_string()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl InputSettings {
    fn sources(&self) -> Result<Vec<Source>> {
        resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")
    }

    fn load(&self, source: &Source) -> Result<FormDefinition> {
        let text = source.read()?;
        xlsform_schema::path_de::load_form(&text, self.json_pointer.as_deref())
            .with_context(|| format!("failed to decode form definition ({source})"))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
            Command::Fields(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
        }
    }
}

impl SchemaOut {
    fn run(&self) -> Result<()> {
        let sources = self.input_settings.sources()?;
        if sources.len() > 1 && self.out_dir.is_none() {
            bail!(
                "{} inputs given; use --out-dir to write one schema per input",
                sources.len()
            );
        }

        let targets = match self.out_dir.as_ref() {
            Some(dir) => Some(batch_targets(dir, &sources)?),
            None => None,
        };

        // 1) load + transform, one independent core call per input
        let rendered = sources
            .into_par_iter()
            .map(|source| -> Result<(Source, String)> {
                let form = self.input_settings.load(&source)?;
                let schema = xlsform_schema::generate_from_definition(&form)
                    .with_context(|| format!("failed to generate schema ({source})"))?;
                let text = render(&schema, self.indent)?;
                Ok((source, text))
            })
            .collect::<Result<Vec<_>>>()?;

        // 2) write
        if let Some(targets) = targets {
            for ((source, text), out) in rendered.iter().zip(targets) {
                write_output(&out, text)?;
                eprintln!("{} {} → {}", "wrote".green().bold(), source, out.display());
            }
        } else if let Some((_, text)) = rendered.first() {
            match self.out.as_ref() {
                Some(out) => {
                    write_output(out, text)?;
                    eprintln!("{} {}", "schema written to".green().bold(), out.display());
                }
                None => println!("{text}"),
            }
        }
        Ok(())
    }
}

impl FieldsOut {
    fn run(&self) -> Result<()> {
        let sources = self.input_settings.sources()?;
        let many = sources.len() > 1;
        for source in sources {
            let form = self.input_settings.load(&source)?;
            if many {
                println!("{}", format!("# {source}").bold());
            }
            for line in field_lines(&form.children) {
                println!("{line}");
            }
        }
        Ok(())
    }
}

impl fmt::Display for FieldLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requiredness = if self.required { "required" } else { "optional" };
        write!(f, "{}\t{}\t{}", self.path, self.base, requiredness)?;
        if self.conditional {
            f.write_str("\tconditional")?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// One `<stem>.schema.json` path per source under `dir`. Two sources that
/// would write the same file are rejected before anything is converted.
fn batch_targets(dir: &Path, sources: &[Source]) -> Result<Vec<PathBuf>> {
    let mut claimed: HashMap<PathBuf, &Source> = HashMap::new();
    let mut targets = Vec::with_capacity(sources.len());
    for source in sources {
        let out = dir.join(format!("{}.schema.json", source.stem()));
        if let Some(previous) = claimed.insert(out.clone(), source) {
            bail!(
                "inputs {previous} and {source} would both be written to {}",
                out.display()
            );
        }
        targets.push(out);
    }
    Ok(targets)
}

/// Pretty JSON with the given indent width; non-ASCII is kept as-is.
fn render(value: &Value, indent: usize) -> Result<String> {
    let indent = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).context("failed to serialize schema")?;
    String::from_utf8(buf).context("serialized schema is not UTF-8")
}

fn write_output(out: &Path, text: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
}

/// Depth-first listing of named fields, in source order.
fn field_lines(nodes: &[FormNode]) -> Vec<FieldLine> {
    fn walk(nodes: &[FormNode], prefix: &str, out: &mut Vec<FieldLine>) {
        for node in nodes {
            let Some(name) = node.name() else { continue };
            let path = format!("{prefix}/{name}");
            match node.kind() {
                NodeKind::Group | NodeKind::Repeat => {
                    walk(node.children.as_deref().unwrap_or_default(), &path, out);
                }
                NodeKind::Field => out.push(FieldLine {
                    base: DeclaredType::parse(&node.declared_type).base.to_string(),
                    required: node.is_required(),
                    conditional: node.is_conditional(),
                    path,
                }),
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, "", &mut out);
    out
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<Source>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<Source>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if pattern == "-" {
            out.push(Source::Stdin);
        } else if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(Source::File(entry?));
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(Source::File(PathBuf::from(pattern)));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "name": "survey",
        "children": [
            {"type": "text", "name": "nom", "bind": {"required": "yes"}},
            {"type": "group", "name": "g", "children": [
                {"type": "select_one yn", "name": "ok", "bind": {"relevant": "${nom} != ''"}}
            ]}
        ],
        "choices": {"yn": [{"name": "yes"}, {"name": "no"}]}
    }"#;

    #[test]
    fn globs_resolve_and_empty_globs_fail() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();

        let pattern = format!("{}/*.json", dir.path().display());
        let found = resolve_file_path_patterns([pattern.as_str(), "-"]).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[2], Source::Stdin);

        let pattern = format!("{}/*.xml", dir.path().display());
        assert!(resolve_file_path_patterns([pattern.as_str()]).is_err());
    }

    #[test]
    fn render_uses_requested_indent_and_keeps_unicode() {
        let text = render(&json!({"é": [1]}), 4).unwrap();
        assert_eq!(text, "{\n    \"é\": [\n        1\n    ]\n}");
    }

    #[test]
    fn field_lines_walk_groups_in_order() {
        let form: FormDefinition = serde_json::from_str(SAMPLE).unwrap();
        let lines: Vec<String> = field_lines(&form.children).iter().map(|l| l.to_string()).collect();
        assert_eq!(
            lines,
            ["/nom\ttext\trequired", "/g/ok\tselect_one\toptional\tconditional"]
        );
    }

    #[test]
    fn schema_command_writes_one_file_per_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.json"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("two.json"), r#"{"children": []}"#).unwrap();
        let out_dir = dir.path().join("out");
        let pattern = format!("{}/*.json", dir.path().display());
        let out_arg = out_dir.display().to_string();

        let cli = CommandLineInterface::try_parse_from([
            "xlsform-schema",
            "schema",
            "-i",
            pattern.as_str(),
            "--out-dir",
            out_arg.as_str(),
        ])
        .unwrap();
        cli.run().unwrap();

        let one: Value =
            serde_json::from_str(&std::fs::read_to_string(out_dir.join("one.schema.json")).unwrap()).unwrap();
        let items = &one["properties"]["value"]["items"];
        assert_eq!(items["required"], json!(["nom"]));
        assert_eq!(items["properties"]["g"]["properties"]["ok"]["enum"], json!(["yes", "no"]));

        let two: Value =
            serde_json::from_str(&std::fs::read_to_string(out_dir.join("two.schema.json")).unwrap()).unwrap();
        assert_eq!(two["properties"]["value"]["items"], json!({"type": "object", "properties": {}}));
    }

    #[test]
    fn schema_command_needs_out_dir_for_many_inputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        let pattern = format!("{}/*.json", dir.path().display());
        let cli = CommandLineInterface::try_parse_from(["xlsform-schema", "schema", "-i", pattern.as_str()])
        .unwrap();
        assert!(cli.run().is_err());
    }

    #[test]
    fn batch_output_name_collision_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["a", "b"] {
            std::fs::create_dir(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("form.json"), SAMPLE).unwrap();
        }
        let out_dir = dir.path().join("out");
        let pattern = format!("{}/*/form.json", dir.path().display());
        let out_arg = out_dir.display().to_string();

        let cli = CommandLineInterface::try_parse_from([
            "xlsform-schema",
            "schema",
            "-i",
            pattern.as_str(),
            "--out-dir",
            out_arg.as_str(),
        ])
        .unwrap();
        let err = format!("{:#}", cli.run().unwrap_err());
        let first = dir.path().join("a").join("form.json").display().to_string();
        let second = dir.path().join("b").join("form.json").display().to_string();
        assert!(err.contains(&first) && err.contains(&second), "{err}");
        assert!(!out_dir.join("form.schema.json").exists());
    }

    #[test]
    fn repeated_stdin_is_a_collision() {
        let err = batch_targets(Path::new("out"), &[Source::Stdin, Source::Stdin]).unwrap_err();
        assert!(err.to_string().contains("<stdin> and <stdin>"), "{err}");
        let targets =
            batch_targets(Path::new("out"), &[Source::Stdin, Source::File("x/form.json".into())]).unwrap();
        assert_eq!(targets, [Path::new("out/stdin.schema.json"), Path::new("out/form.schema.json")]);
    }

    #[test]
    fn structural_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.json");
        std::fs::write(&input, r#"{"children": [{"type": "group", "name": "g"}]}"#).unwrap();
        let input_arg = input.display().to_string();
        let out_arg = dir.path().join("out.json").display().to_string();
        let cli = CommandLineInterface::try_parse_from([
            "xlsform-schema",
            "schema",
            "-i",
            input_arg.as_str(),
            "-o",
            out_arg.as_str(),
        ])
        .unwrap();
        let err = format!("{:#}", cli.run().unwrap_err());
        assert!(err.contains("broken.json"), "{err}");
        assert!(err.contains("group `/g`"), "{err}");
    }
}
