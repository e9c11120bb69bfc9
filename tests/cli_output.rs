use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use serde_json::{json, Value};
use tempfile::tempdir;

fn write_inputs(root: &Path) -> Result<()> {
    let repos = json!([{
        "name": "pandas-tools",
        "full_name": "someone/pandas-tools",
        "description": "data analysis toolkit",
        "url": "https://github.com/someone/pandas-tools",
        "stars": 500,
        "forks": 12,
        "created_at": "2020-01-01",
        "updated_at": "2024-01-01",
        "topics": ["data-science"],
        "languages": {"Python": 100},
        "readme_content": "analysis toolkit for data science"
    }]);
    let datasets = json!([{
        "ref": "ds1",
        "title": "Analysis Dataset",
        "url": "https://www.kaggle.com/datasets/ds1",
        "description": "dataset for data science analysis",
        "download_count": 1000,
        "view_count": 500,
        "vote_count": 50,
        "last_updated": "2024-01-01",
        "tags": ["data-science"]
    }]);
    fs::write(root.join("github_repos.json"), serde_json::to_string(&repos)?)?;
    fs::write(root.join("kaggle_datasets.json"), serde_json::to_string(&datasets)?)?;

    let config = format!(
        r#"
        [sources]
        repositories_path = "{repos}"
        datasets_path = "{datasets}"

        [output]
        directory = "{out}"

        [logging]
        directory = "{logs}"
        "#,
        repos = root.join("github_repos.json").display(),
        datasets = root.join("kaggle_datasets.json").display(),
        out = root.join("processed").display(),
        logs = root.join("logs").display(),
    );
    fs::write(root.join("config.toml"), config)?;
    Ok(())
}

fn run_cli(root: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_data_insights"))
        .current_dir(root)
        .arg("--config")
        .arg(root.join("config.toml"))
        .args(args)
        .env_remove("INSIGHTS_RAW_REPOS")
        .env_remove("INSIGHTS_RAW_DATASETS")
        .env_remove("INSIGHTS_OUTPUT_DIR")
        .env_remove("INSIGHTS_MIN_SIMILARITY")
        .env("RUST_LOG", "data_insights=debug")
        .output()?;
    Ok(output)
}

#[test]
fn test_run_json_writes_only_the_result_to_stdout() -> Result<()> {
    let root = tempdir()?;
    write_inputs(root.path())?;

    let output = run_cli(root.path(), &["run", "--json", "--reference-date", "2024-02-01"])?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["reference_date"], json!("2024-02-01"));
    assert_eq!(result["counts"]["relationships"], json!(1));
    assert_eq!(result["artifacts"].as_array().map(Vec::len), Some(4));

    // log lines still reach the console, on stderr
    assert!(!output.stderr.is_empty());
    Ok(())
}

#[test]
fn test_failed_run_json_still_parses_and_exits_non_zero() -> Result<()> {
    let root = tempdir()?;
    write_inputs(root.path())?;
    fs::remove_file(root.path().join("kaggle_datasets.json"))?;

    let output = run_cli(root.path(), &["run", "--json", "--reference-date", "2024-02-01"])?;

    assert!(!output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(result["success"], json!(false));
    let cause = result["cause"].as_str().unwrap_or_default();
    assert!(cause.contains("kaggle"), "{}", cause);
    Ok(())
}
