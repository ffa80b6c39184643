use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["forumlens-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn collect_defaults_to_configured_communities() {
    let cli = Cli::try_parse_from(["forumlens-cli", "collect"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            ref communities,
            limit: None,
            output: None,
            dry_run: false,
        }) if communities.is_empty()
    ));
}

#[test]
fn collect_accepts_repeated_communities_and_overrides() {
    let cli = Cli::try_parse_from([
        "forumlens-cli",
        "collect",
        "--community",
        "gadgets",
        "--community",
        "frugal",
        "--limit",
        "5",
        "--output",
        "/tmp/raw.parquet",
        "--dry-run",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Collect {
        communities,
        limit,
        output,
        dry_run,
    }) = cli.command
    else {
        panic!("expected collect command");
    };
    assert_eq!(communities, vec!["gadgets", "frugal"]);
    assert_eq!(limit, Some(5));
    assert_eq!(output, Some(PathBuf::from("/tmp/raw.parquet")));
    assert!(dry_run);
}

#[test]
fn collect_rejects_non_numeric_limit() {
    assert!(Cli::try_parse_from(["forumlens-cli", "collect", "--limit", "many"]).is_err());
}

#[test]
fn report_defaults() {
    let cli = Cli::try_parse_from(["forumlens-cli", "report"]).expect("expected valid cli args");
    let Some(Commands::Report {
        input,
        community,
        sentiment,
        min_enthusiasm,
    }) = cli.command
    else {
        panic!("expected report command");
    };
    assert!(input.is_none());
    assert!(community.is_none());
    assert!(sentiment.is_none());
    assert!(min_enthusiasm.abs() < f64::EPSILON);
}

#[test]
fn report_with_filters() {
    let cli = Cli::try_parse_from([
        "forumlens-cli",
        "report",
        "--input",
        "data/deduped_analysis.parquet",
        "--community",
        "gadgets",
        "--sentiment",
        "positive",
        "--min-enthusiasm",
        "0.25",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Report {
        input,
        community,
        sentiment,
        min_enthusiasm,
    }) = cli.command
    else {
        panic!("expected report command");
    };
    assert_eq!(input, Some(PathBuf::from("data/deduped_analysis.parquet")));
    assert_eq!(community.as_deref(), Some("gadgets"));
    assert_eq!(sentiment.as_deref(), Some("positive"));
    assert!((min_enthusiasm - 0.25).abs() < f64::EPSILON);
}
