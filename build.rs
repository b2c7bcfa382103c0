fn main() {
    load_wifi_credentials();

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

/// Export `WIFI_SSID` / `WIFI_PASSWORD` to the compiler.
///
/// Real environment variables win over `.env`; unset values become empty
/// strings so `env!` always resolves.
fn load_wifi_credentials() {
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_PASSWORD");

    if std::path::Path::new(".env").exists() {
        if let Err(e) = dotenvy::dotenv() {
            println!("cargo:warning=failed to load .env: {e}");
        }
    }

    let ssid = std::env::var("WIFI_SSID").unwrap_or_default();
    let password = std::env::var("WIFI_PASSWORD").unwrap_or_default();

    println!("cargo:rustc-env=WIFI_SSID={}", ssid.trim());
    println!("cargo:rustc-env=WIFI_PASSWORD={}", password.trim());

    if ssid.trim().is_empty() {
        println!("cargo:warning=WIFI_SSID is empty - the node will not join a network");
    }
}
