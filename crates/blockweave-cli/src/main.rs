use anyhow::{Context, Result};
use blockweave_config::Config;
use blockweave_engine::dev_utils::{get_data, parse, set_data};
use blockweave_engine::lists::invariants::{Violation, check};
use blockweave_engine::{Editor, Feature, ListType};
use std::{env, path::Path, process};

fn editor_from_config(config: &Config) -> Result<Editor> {
    let flags = &config.features;
    let features = [
        (flags.document_list, Feature::DocumentList),
        (flags.legacy_list, Feature::LegacyList),
        (flags.block_quote, Feature::BlockQuote),
        (flags.table, Feature::Table),
        (flags.heading, Feature::Heading),
    ]
    .into_iter()
    .filter_map(|(enabled, feature)| enabled.then_some(feature));

    let default_type: ListType = config.lists.default_type.parse()?;
    let editor = Editor::builder()
        .features(features)
        .default_list_type(default_type)
        .build()?;
    Ok(editor)
}

/// Load the document through a change session so every repair stage runs,
/// and return the repaired markup.
fn fix(editor: &mut Editor, markup: &str) -> Result<String> {
    let selection = set_data(editor.model_mut(), markup)?;
    let operations: usize = editor
        .model()
        .batches()
        .iter()
        .map(|batch| batch.operations.len())
        .sum();
    log::info!("applied {operations} operations");
    Ok(get_data(editor.model(), selection.as_ref()))
}

/// Load the document as-is and report what is wrong with it.
fn check_markup(editor: &mut Editor, markup: &str) -> Result<Vec<Violation>> {
    let (document, _) = parse(markup)?;
    editor.model_mut().load(document);
    Ok(check(editor.model().document(), editor.model().schema()))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_config() -> Config {
    match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::debug!(
                "no config at {}, using defaults",
                Config::config_path().display()
            );
            Config::default()
        }
        Err(e) => {
            log::warn!("{e}, using defaults");
            Config::default()
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <fix|check> <document>");
    eprintln!("Config is read from {}", Config::config_path().display());
    process::exit(2);
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("blockweave-cli");
    if args.len() != 3 {
        usage(program);
    }
    let path = Path::new(&args[2]);

    let config = load_config();
    let mut editor = editor_from_config(&config)?;
    let markup = read(path)?;

    match args[1].as_str() {
        "fix" => {
            let fixed = fix(&mut editor, &markup)?;
            std::fs::write(path, fixed)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        "check" => {
            let violations = check_markup(&mut editor, &markup)?;
            for violation in &violations {
                println!("{}: {violation}", path.display());
            }
            if !violations.is_empty() {
                process::exit(1);
            }
        }
        _ => usage(program),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const BROKEN: &str = r#"<paragraph listIndent="1" listItemId="a" listType="bulleted">a</paragraph><paragraph listIndent="3" listItemId="b" listType="bulleted">b</paragraph>"#;

    #[test]
    fn test_fix_repairs_document() {
        let mut editor = editor_from_config(&Config::default()).unwrap();

        let fixed = fix(&mut editor, BROKEN).unwrap();

        assert_eq!(
            fixed,
            r#"<paragraph listIndent="0" listItemId="a" listType="bulleted">a</paragraph><paragraph listIndent="1" listItemId="b" listType="bulleted">b</paragraph>"#
        );
    }

    #[test]
    fn test_check_reports_without_repairing() {
        let mut editor = editor_from_config(&Config::default()).unwrap();

        let violations = check_markup(&mut editor, BROKEN).unwrap();

        let paths: Vec<_> = violations.iter().map(|v| v.path.clone()).collect();
        assert_eq!(paths, vec![vec![0], vec![1]]);
        assert_eq!(get_data(editor.model(), None), BROKEN);
    }

    #[test]
    fn test_fixed_document_checks_clean() {
        let mut editor = editor_from_config(&Config::default()).unwrap();
        let fixed = fix(&mut editor, BROKEN).unwrap();

        let mut editor = editor_from_config(&Config::default()).unwrap();
        assert!(check_markup(&mut editor, &fixed).unwrap().is_empty());
    }

    #[test]
    fn test_conflicting_flags_are_an_error() {
        let mut config = Config::default();
        config.features.legacy_list = true;

        assert!(editor_from_config(&config).is_err());
    }

    #[test]
    fn test_default_type_from_config() {
        let mut config = Config::default();
        config.lists.default_type = "numbered".to_string();
        let mut editor = editor_from_config(&config).unwrap();

        let fixed = fix(&mut editor, r#"<paragraph listItemId="a">a</paragraph>"#).unwrap();

        assert_eq!(
            fixed,
            r#"<paragraph listIndent="0" listItemId="a" listType="numbered">a</paragraph>"#
        );
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");

        let error = read(&missing).unwrap_err();

        assert!(error.to_string().contains("missing.txt"));
    }
}
