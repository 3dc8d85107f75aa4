//! `.env` values reach argument parsing

use std::fs;

use calfeed_lib::cli::{load_env_then_parse, Commands};

#[test]
fn config_path_from_env_file_is_picked_up() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config_path = dir.path().join("from-dotenv.toml");
    let env_file = dir.path().join(".env");
    fs::write(&env_file, format!("CALFEED_CONFIG={}\n", config_path.display()))
        .expect("write .env");

    let (cli, dotenv) =
        load_env_then_parse(Some(&env_file), ["calfeed", "list"]).expect("args should parse");

    assert_eq!(dotenv.expect("env file loaded"), env_file);
    assert_eq!(cli.config.as_deref(), Some(config_path.as_path()));
    assert!(matches!(cli.command, Commands::List { json: false }));
}

#[test]
fn missing_env_file_still_parses_arguments() {
    let dir = tempfile::tempdir().expect("temp dir");
    let absent = dir.path().join("absent.env");

    let (cli, dotenv) = load_env_then_parse(
        Some(&absent),
        ["calfeed", "--config", "mine.toml", "run", "daily_wisdom", "--set", "style=诗意"],
    )
    .expect("args should parse");

    assert!(dotenv.is_err());
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("mine.toml")));
    match cli.command {
        Commands::Run { feed, settings, json } => {
            assert_eq!(feed, "daily_wisdom");
            assert_eq!(settings, vec!["style=诗意"]);
            assert!(!json);
        }
        other => panic!("expected run, got {other:?}"),
    }
}
