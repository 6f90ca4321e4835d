use assert_cmd::Command;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("janani-assistant").expect("binary exists");
    cmd.env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_KEY")
        .env_remove("CLASSIFIER_SEED")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn cli_help_runs() {
    cli().arg("--help").assert().success();
}

#[test]
fn classify_without_models_reports_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli()
        .env("MODEL_PATH", dir.path())
        .args(["classify", "morning nausea"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("model unavailable"), "stderr: {stderr}");
}

#[test]
fn train_then_rank_remedies() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let models = dir.path().join("models");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("remedies.csv"),
        "features,remedies\n\
         nausea vomiting pitta,Ginger tea;Coconut water\n\
         back pain vata,Warm sesame oil massage\n",
    )
    .unwrap();

    cli()
        .env("DATA_DIR", &data)
        .env("MODEL_PATH", &models)
        .arg("train")
        .assert()
        .success();
    assert!(models.join("ayurvedic/remedy_corpus.json").exists());

    let output = cli()
        .env("MODEL_PATH", &models)
        .args(["remedy", "--symptom", "nausea", "--prakriti", "pitta"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let scored: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(scored[0]["remedy"], "Ginger tea");
    assert_eq!(scored[0]["confidence"], 0.9);
    assert_eq!(scored[1]["remedy"], "Coconut water");
}

#[test]
fn train_without_datasets_fails() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .env("DATA_DIR", dir.path())
        .env("MODEL_PATH", dir.path().join("models"))
        .arg("train")
        .assert()
        .failure();
}

#[test]
fn train_then_predict_maternal_status() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let models = dir.path().join("models");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("maternal.csv"),
        "age,systolic_bp,diastolic_bp,blood_glucose,body_temp,heart_rate,status\n\
         25,110,70,90,36.8,76,Normal\n\
         29,115,75,92,36.7,74,Normal\n\
         33,138,88,120,37.0,84,Suspect\n\
         35,142,90,125,37.1,86,Suspect\n\
         38,165,105,160,37.4,95,Pathological\n\
         40,170,110,170,37.6,98,Pathological\n",
    )
    .unwrap();

    cli()
        .env("DATA_DIR", &data)
        .env("MODEL_PATH", &models)
        .arg("train")
        .assert()
        .success();
    assert!(models.join("maternal_status.json").exists());

    let output = cli()
        .env("MODEL_PATH", &models)
        .args(["status", "maternal", "30", "112", "72", "91", "36.8", "75"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let prediction: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(prediction["status"].is_string(), "{prediction}");
    assert_eq!(prediction["probabilities"].as_array().unwrap().len(), 3);
}

#[test]
fn status_with_wrong_reading_length_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli()
        .env("MODEL_PATH", dir.path())
        .args(["status", "fetal", "1", "2"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
