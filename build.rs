use std::env;
use std::fs;
use std::path::Path;

// Solo se exportan las claves del campus; el resto del .env se ignora
const PREFIX: &str = "CAMPUS_";

fn main() {
    let env_file = Path::new(".env");

    if let Ok(contents) = fs::read_to_string(env_file) {
        println!("cargo:rerun-if-changed=.env");

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            // Las variables del entorno real tienen prioridad sobre el .env
            if key.starts_with(PREFIX) && env::var(key).is_err() {
                println!("cargo:rustc-env={}={}", key, value);
            }
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
    for key in [
        "CAMPUS_BACKEND_URL_DEVELOPMENT",
        "CAMPUS_BACKEND_URL_PRODUCTION",
        "CAMPUS_ENVIRONMENT",
        "CAMPUS_CLIENT",
        "CAMPUS_DISABLED_PAGES",
        "CAMPUS_PROGRESS_FLUSH_SECONDS",
        "CAMPUS_UNLOCK_DELAY_MS",
        "CAMPUS_SESSION_DURABLE_DAYS",
        "CAMPUS_SESSION_EXPIRING_MINUTES",
    ] {
        println!("cargo:rerun-if-env-changed={}", key);
    }
}
