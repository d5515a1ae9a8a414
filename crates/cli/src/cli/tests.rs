use super::*;

fn parse(args: &[&str]) -> Cli {
	Cli::try_parse_from(std::iter::once("docid").chain(args.iter().copied())).unwrap()
}

#[test]
fn parse_lookup() {
	let cli = parse(&["lookup", "map.csv", "cust", "cust0"]);
	assert_eq!(
		cli.command,
		Command::Lookup {
			snapshot: PathBuf::from("map.csv"),
			scope: "cust".to_string(),
			id: "cust0".to_string(),
		}
	);
	assert!(!cli.verbose);
	assert_eq!(cli.config, None);
}

#[test]
fn parse_merge_keeps_snapshot_order() {
	let cli = parse(&["merge", "b.csv", "a.csv", "-o", "out.csv"]);
	assert_eq!(
		cli.command,
		Command::Merge {
			snapshots: vec![PathBuf::from("b.csv"), PathBuf::from("a.csv")],
			output: PathBuf::from("out.csv"),
		}
	);
}

#[test]
fn merge_requires_input_and_output() {
	assert!(Cli::try_parse_from(["docid", "merge", "-o", "out.csv"]).is_err());
	assert!(Cli::try_parse_from(["docid", "merge", "a.csv"]).is_err());
}

#[test]
fn bench_defaults() {
	let cli = parse(&["bench"]);
	assert_eq!(
		cli.command,
		Command::Bench {
			records: 50_000,
			workers: 1,
			scope: BENCH_SCOPE.to_string(),
		}
	);
}

#[test]
fn bench_rejects_zero_workers() {
	assert!(Cli::try_parse_from(["docid", "bench", "--workers", "0"]).is_err());
}

#[test]
fn global_flags_after_subcommand() {
	let cli = parse(&["inspect", "map.csv", "--verbose", "--config", "docid.toml"]);
	assert!(cli.verbose);
	assert_eq!(cli.config, Some(PathBuf::from("docid.toml")));
}

#[test]
fn explicit_config_path_wins_even_if_missing() {
	let resolved = resolve_config_path(
		Some(Path::new("/nonexistent/docid.toml")),
		Some(PathBuf::from("/also/missing.toml")),
	);
	assert_eq!(resolved, Some(PathBuf::from("/nonexistent/docid.toml")));
}

#[test]
fn default_config_path_only_when_present() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("config.toml");
	assert_eq!(resolve_config_path(None, Some(path.clone())), None);

	std::fs::write(&path, "[persistence]\ndelimiter = \",\"\n").unwrap();
	assert_eq!(resolve_config_path(None, Some(path.clone())), Some(path));
	assert_eq!(resolve_config_path(None, None), None);
}

#[test]
fn explicit_config_is_loaded() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("docid.toml");
	std::fs::write(&path, "[persistence]\ndelimiter = \",\"\n").unwrap();

	let cli = parse(&["--config", path.to_str().unwrap(), "inspect", "map.csv"]);
	let config = cli.load_config().unwrap();
	assert_eq!(config.persistence.delimiter, ',');
}

#[test]
fn missing_explicit_config_is_an_error() {
	let cli = parse(&["--config", "/nonexistent/docid.toml", "inspect", "map.csv"]);
	assert!(matches!(cli.load_config(), Err(ConfigError::Io { .. })));
}
