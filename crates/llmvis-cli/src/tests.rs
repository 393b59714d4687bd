use clap::Parser;
use llmvis_core::GroupDimension;

use super::{Cli, Commands, DbCommands};
use crate::analyze::parse_request_yaml;
use crate::reports::{truncate, ReportsCommands};

#[test]
fn no_subcommand_is_accepted() {
    let cli = Cli::try_parse_from(["llmvis-cli"]).expect("bare invocation parses");
    assert!(cli.command.is_none());
}

#[test]
fn db_subcommands_parse() {
    let cli = Cli::try_parse_from(["llmvis-cli", "db", "ping"]).expect("db ping parses");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));

    let cli = Cli::try_parse_from(["llmvis-cli", "db", "migrate"]).expect("db migrate parses");
    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn analyze_flags_build_request_with_defaults_left_unset() {
    let cli = Cli::try_parse_from([
        "llmvis-cli",
        "analyze",
        "--brand",
        "Acme",
        "--model",
        "gpt-4,llama",
        "--keyword",
        "rockets",
        "--competitor",
        "Globex",
    ])
    .expect("analyze parses");

    let Some(Commands::Analyze(args)) = cli.command else {
        panic!("expected analyze command");
    };
    let request = args.to_request();
    assert_eq!(request.brand_name, "Acme");
    assert_eq!(request.models, vec!["gpt-4", "llama"]);
    assert_eq!(request.keywords, vec!["rockets"]);
    assert_eq!(request.competitor_names, Some(vec!["Globex".to_string()]));
    assert_eq!(request.regions, None);
    assert_eq!(request.languages, None);
    assert_eq!(request.prompt_templates, None);

    let validated = request.validate().expect("request is valid");
    assert_eq!(validated.regions, vec!["Global"]);
    assert_eq!(validated.job_count(), 2);
}

#[test]
fn analyze_repeated_flags_accumulate() {
    let cli = Cli::try_parse_from([
        "llmvis-cli",
        "analyze",
        "--brand",
        "Acme",
        "--model",
        "gpt-4",
        "--keyword",
        "rockets",
        "--region",
        "France",
        "--region",
        "Japan",
        "--language",
        "fr",
        "--template",
        "Who sells {keyword}?",
        "--owner",
        "alice",
    ])
    .expect("analyze parses");

    let Some(Commands::Analyze(args)) = cli.command else {
        panic!("expected analyze command");
    };
    assert_eq!(args.owner.as_deref(), Some("alice"));
    let request = args.to_request();
    assert_eq!(
        request.regions,
        Some(vec!["France".to_string(), "Japan".to_string()])
    );
    assert_eq!(request.languages, Some(vec!["fr".to_string()]));
    assert_eq!(
        request.prompt_templates,
        Some(vec!["Who sells {keyword}?".to_string()])
    );
}

#[test]
fn analyze_requires_brand_or_file() {
    let result = Cli::try_parse_from(["llmvis-cli", "analyze", "--model", "gpt-4"]);
    assert!(result.is_err());
}

#[test]
fn analyze_file_conflicts_with_brand() {
    let result = Cli::try_parse_from([
        "llmvis-cli",
        "analyze",
        "--file",
        "request.yaml",
        "--brand",
        "Acme",
    ]);
    assert!(result.is_err());
}

#[test]
fn analyze_file_conflicts_with_every_dimension_flag() {
    for flag in ["--competitor", "--region", "--language", "--template"] {
        let result = Cli::try_parse_from([
            "llmvis-cli",
            "analyze",
            "--file",
            "request.yaml",
            flag,
            "value",
        ]);
        assert!(result.is_err(), "{flag} should conflict with --file");
    }
}

#[test]
fn request_yaml_parses_optional_dimensions() {
    let request = parse_request_yaml(
        "brand_name: Acme\n\
         models: [gpt-4]\n\
         keywords: [rockets, jetpacks]\n\
         languages: [default, fr]\n",
    )
    .expect("yaml parses");

    assert_eq!(request.brand_name, "Acme");
    assert_eq!(request.keywords.len(), 2);
    assert_eq!(
        request.languages,
        Some(vec!["default".to_string(), "fr".to_string()])
    );
    assert_eq!(request.regions, None);
    assert_eq!(request.competitor_names, None);
}

#[test]
fn request_yaml_missing_models_is_an_error() {
    let err = parse_request_yaml("brand_name: Acme\nkeywords: [rockets]\n")
        .expect_err("models is required");
    assert!(err.to_string().contains("invalid analysis request YAML"));
}

#[test]
fn reports_list_defaults() {
    let cli = Cli::try_parse_from(["llmvis-cli", "reports", "list"]).expect("list parses");
    assert!(matches!(
        cli.command,
        Some(Commands::Reports {
            command: ReportsCommands::List {
                owner: None,
                limit: 20,
                offset: 0
            }
        })
    ));
}

#[test]
fn reports_show_and_delete_take_an_id() {
    let cli = Cli::try_parse_from(["llmvis-cli", "reports", "show", "7"]).expect("show parses");
    assert!(matches!(
        cli.command,
        Some(Commands::Reports {
            command: ReportsCommands::Show { id: 7 }
        })
    ));

    let cli =
        Cli::try_parse_from(["llmvis-cli", "reports", "delete", "7"]).expect("delete parses");
    assert!(matches!(
        cli.command,
        Some(Commands::Reports {
            command: ReportsCommands::Delete { id: 7 }
        })
    ));
}

#[test]
fn kpis_parses_group_by_and_filters() {
    let cli = Cli::try_parse_from([
        "llmvis-cli",
        "kpis",
        "3",
        "--group-by",
        "model",
        "--region",
        "France",
    ])
    .expect("kpis parses");

    let Some(Commands::Kpis {
        report_id,
        region,
        group_by,
        model,
        ..
    }) = cli.command
    else {
        panic!("expected kpis command");
    };
    assert_eq!(report_id, 3);
    assert_eq!(region.as_deref(), Some("France"));
    assert_eq!(model, None);
    assert_eq!(group_by, Some(GroupDimension::Model));
}

#[test]
fn kpis_rejects_unknown_group_by() {
    let result = Cli::try_parse_from(["llmvis-cli", "kpis", "3", "--group-by", "color"]);
    assert!(result.is_err());
}

#[test]
fn truncate_marks_clipped_values() {
    assert_eq!(truncate("Acme", 8), "Acme");
    assert_eq!(truncate("Acme Corporation", 8), "Acme Co~");
}
