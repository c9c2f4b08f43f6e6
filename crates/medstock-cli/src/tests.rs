use super::*;

#[test]
fn parses_init_command() {
    let cli = Cli::try_parse_from(["medstock-cli", "init"]).expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Init { reset: false }));
}

#[test]
fn parses_init_with_reset_flag() {
    let cli =
        Cli::try_parse_from(["medstock-cli", "init", "--reset"]).expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Init { reset: true }));
}

#[test]
fn parses_import_products_with_path() {
    let cli = Cli::try_parse_from(["medstock-cli", "import-products", "catalog.csv"])
        .expect("expected valid cli args");

    match cli.command {
        Commands::ImportProducts { path, columns } => {
            assert_eq!(path, PathBuf::from("catalog.csv"));
            assert!(columns.is_none());
        }
        other => panic!("expected import-products, got {other:?}"),
    }
}

#[test]
fn parses_import_orders_with_columns_override() {
    let cli = Cli::try_parse_from([
        "medstock-cli",
        "import-orders",
        "history.csv",
        "--columns",
        "columns.yaml",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::ImportOrders { path, columns } => {
            assert_eq!(path, PathBuf::from("history.csv"));
            assert_eq!(columns, Some(PathBuf::from("columns.yaml")));
        }
        other => panic!("expected import-orders, got {other:?}"),
    }
}

#[test]
fn parses_status_command() {
    let cli = Cli::try_parse_from(["medstock-cli", "status"]).expect("expected valid cli args");

    assert!(matches!(cli.command, Commands::Status));
}

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["medstock-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Ping
        }
    ));
}

#[test]
fn import_products_requires_a_path() {
    assert!(Cli::try_parse_from(["medstock-cli", "import-products"]).is_err());
}

#[test]
fn rejects_unknown_command() {
    assert!(Cli::try_parse_from(["medstock-cli", "export"]).is_err());
}
