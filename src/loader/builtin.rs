//! Builtin loaders.
//!
//! JS and CSS minification use oxc and lightningcss; the rest are small pure
//! transforms. Every loader follows the same contract: content in, content
//! or an identifiable error out, no filesystem access.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use super::LoaderContext;
use crate::core::LoaderError;

/// Minify JavaScript source code.
///
/// Options: `mangle` (bool, default true) - shorten identifier names.
pub fn minify_js(source: &str, ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
    let mangle = ctx
        .options
        .get("mangle")
        .and_then(toml::Value::as_bool)
        .unwrap_or(true);

    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(LoaderError::Parse(error.to_string()));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: mangle.then(MangleOptions::default),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str, _ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| LoaderError::Parse(e.to_string()))?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| LoaderError::Parse(e.to_string()))?;
    Ok(result.code)
}

/// Embed a JSON document as an ES module default export.
pub fn json(source: &str, _ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
    let value: serde_json::Value =
        serde_json::from_str(source).map_err(|e| LoaderError::Parse(e.to_string()))?;
    Ok(format!("export default {value};\n"))
}

/// Prepend a comment banner.
///
/// Options: `text` (string, required).
pub fn banner(source: &str, ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
    let text = ctx
        .options
        .get("text")
        .and_then(toml::Value::as_str)
        .ok_or_else(|| LoaderError::Options("banner requires a `text` string option".into()))?;
    Ok(format!("/* {text} */\n{source}"))
}

/// Strip conditional-compilation blocks whose symbol is not defined.
///
/// Blocks are line-delimited:
///
/// ```text
/// // #if DEBUG
/// console.log("dev only");
/// // #endif
/// ```
///
/// The active symbol set comes from the merged `defines` option, which the
/// executor seeds from the build mode (so the block above survives
/// development builds and is dropped from production ones). Directive lines
/// are always removed. Blocks nest; an unbalanced `#endif` is an error.
pub fn strip_defines(source: &str, ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
    let defines: Vec<&str> = match ctx.options.get("defines") {
        Some(toml::Value::Array(symbols)) => {
            symbols.iter().filter_map(toml::Value::as_str).collect()
        }
        _ => Vec::new(),
    };

    let mut out = String::with_capacity(source.len());
    // Stack of "this block is active" flags; a block is emitted only if all
    // enclosing blocks are active too.
    let mut stack: Vec<bool> = Vec::new();

    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(symbol) = trimmed.strip_prefix("// #if ") {
            stack.push(defines.contains(&symbol.trim()));
            continue;
        }
        if trimmed == "// #endif" {
            if stack.pop().is_none() {
                return Err(LoaderError::Parse("`// #endif` without `// #if`".into()));
            }
            continue;
        }
        if stack.iter().all(|active| *active) {
            out.push_str(line);
            out.push('\n');
        }
    }

    if !stack.is_empty() {
        return Err(LoaderError::Parse("unterminated `// #if` block".into()));
    }
    Ok(out)
}

/// Identity transformation.
pub fn raw(source: &str, _ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
    Ok(source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx_with(options: toml::Table) -> LoaderContext<'static> {
        LoaderContext {
            path: Path::new("test.js"),
            options,
            defines: &[],
        }
    }

    fn ctx() -> LoaderContext<'static> {
        ctx_with(toml::Table::new())
    }

    #[test]
    fn test_raw_is_identity() {
        assert_eq!(raw("let x = 1;", &ctx()).unwrap(), "let x = 1;");
    }

    #[test]
    fn test_json_wraps_document() {
        let out = json(r#"{"a": 1}"#, &ctx()).unwrap();
        assert_eq!(out, "export default {\"a\":1};\n");
    }

    #[test]
    fn test_json_rejects_malformed_input() {
        assert!(matches!(
            json("{not json", &ctx()),
            Err(LoaderError::Parse(_))
        ));
    }

    #[test]
    fn test_banner_requires_text() {
        assert!(matches!(
            banner("body {}", &ctx()),
            Err(LoaderError::Options(_))
        ));

        let mut options = toml::Table::new();
        options.insert("text".into(), toml::Value::String("hello".into()));
        let out = banner("body {}", &ctx_with(options)).unwrap();
        assert_eq!(out, "/* hello */\nbody {}");
    }

    #[test]
    fn test_strip_defines_keeps_defined_blocks() {
        let mut options = toml::Table::new();
        options.insert(
            "defines".into(),
            toml::Value::Array(vec![toml::Value::String("DEBUG".into())]),
        );
        let source = "a();\n// #if DEBUG\nlog();\n// #endif\nb();\n";
        let out = strip_defines(source, &ctx_with(options)).unwrap();
        assert_eq!(out, "a();\nlog();\nb();\n");
    }

    #[test]
    fn test_strip_defines_drops_undefined_blocks() {
        let source = "a();\n// #if DEBUG\nlog();\n// #endif\nb();\n";
        let out = strip_defines(source, &ctx()).unwrap();
        assert_eq!(out, "a();\nb();\n");
    }

    #[test]
    fn test_strip_defines_nested_blocks() {
        let mut options = toml::Table::new();
        options.insert(
            "defines".into(),
            toml::Value::Array(vec![toml::Value::String("DEBUG".into())]),
        );
        // Outer block is inactive, so the nested active block is dropped too.
        let source = "// #if TRACE\n// #if DEBUG\nlog();\n// #endif\n// #endif\nb();\n";
        let out = strip_defines(source, &ctx_with(options)).unwrap();
        assert_eq!(out, "b();\n");
    }

    #[test]
    fn test_strip_defines_unbalanced_is_error() {
        assert!(strip_defines("// #endif\n", &ctx()).is_err());
        assert!(strip_defines("// #if DEBUG\nx();\n", &ctx()).is_err());
    }

    #[test]
    fn test_minify_css_basic() {
        let out = minify_css("body {\n  color: #ff0000;\n}\n", &ctx()).unwrap();
        assert!(out.len() < "body {\n  color: #ff0000;\n}\n".len());
        assert!(out.contains("body"));
    }

    #[test]
    fn test_minify_js_rejects_malformed_input() {
        assert!(matches!(
            minify_js("let let = ;", &ctx()),
            Err(LoaderError::Parse(_))
        ));
    }

    #[test]
    fn test_minify_js_shrinks_source() {
        let source = "function add(first, second) {\n  return first + second;\n}\nexport { add };\n";
        let out = minify_js(source, &ctx()).unwrap();
        assert!(out.len() < source.len());
    }
}
