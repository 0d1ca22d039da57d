use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["tweetscope"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn annotate_defaults_to_abort_and_no_overrides() {
    let cli = Cli::try_parse_from(["tweetscope", "annotate"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Annotate {
            input: None,
            output: None,
            model_cache_dir: None,
            skip_failed: false,
            dry_run: false,
        })
    ));
}

#[test]
fn annotate_accepts_path_overrides_and_flags() {
    let cli = Cli::try_parse_from([
        "tweetscope",
        "annotate",
        "--input",
        "in.pkl",
        "--output",
        "out.csv",
        "--model-cache-dir",
        "models",
        "--skip-failed",
        "--dry-run",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Annotate {
            input,
            output,
            model_cache_dir,
            skip_failed,
            dry_run,
        }) => {
            assert_eq!(input, Some(PathBuf::from("in.pkl")));
            assert_eq!(output, Some(PathBuf::from("out.csv")));
            assert_eq!(model_cache_dir, Some(PathBuf::from("models")));
            assert!(skip_failed);
            assert!(dry_run);
        }
        other => panic!("expected Annotate, got: {other:?}"),
    }
}

#[test]
fn summary_parses_topic_top_and_json() {
    let cli = Cli::try_parse_from([
        "tweetscope",
        "summary",
        "--input",
        "final.csv",
        "--topic",
        "-1",
        "--top",
        "3",
        "--json",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Summary {
            input,
            topic,
            top,
            json,
        }) => {
            assert_eq!(input, PathBuf::from("final.csv"));
            assert_eq!(topic, Some(TopicId::OUTLIER));
            assert_eq!(top, 3);
            assert!(json);
        }
        other => panic!("expected Summary, got: {other:?}"),
    }
}

#[test]
fn summary_rejects_topic_below_outlier() {
    let result = Cli::try_parse_from(["tweetscope", "summary", "--topic", "-2"]);
    assert!(result.is_err());
}

#[test]
fn summary_top_defaults_to_five() {
    let cli = Cli::try_parse_from(["tweetscope", "summary", "--input", "x.csv"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Summary {
            top: 5,
            topic: None,
            json: false,
            ..
        })
    ));
}

#[test]
fn evaluate_limit_is_optional() {
    let cli = Cli::try_parse_from(["tweetscope", "evaluate"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Evaluate { limit: None })
    ));
    let cli = Cli::try_parse_from(["tweetscope", "evaluate", "--limit", "100"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Evaluate { limit: Some(100) })
    ));
}

#[test]
fn clean_takes_positional_text() {
    let cli = Cli::try_parse_from(["tweetscope", "clean", "Hello @you!"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Clean { ref text }) if text == "Hello @you!"
    ));
}

#[test]
fn parse_topic_trims_and_validates() {
    assert_eq!(parse_topic(" 7 ").unwrap().get(), 7);
    assert!(parse_topic("abc").is_err());
}
