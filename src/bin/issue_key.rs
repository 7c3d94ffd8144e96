//! API key issuance tool
//!
//! Creates the user if needed and prints a fresh API key. Only its SHA-256
//! digest is stored, so the key cannot be shown again.
//!
//! Run with: cargo run --bin issue_key -- --email priya@example.com --name laptop

use budget_tracker::db;
use budget_tracker::repository::UserRepository;
use rand::RngCore;

/// Prefix that makes keys recognisable in config files
const KEY_PREFIX: &str = "bt_";

fn arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", KEY_PREFIX, hex::encode(bytes))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let email = arg(&args, "--email")
        .ok_or_else(|| anyhow::anyhow!("usage: issue_key --email <email> [--name <key name>]"))?;
    let key_name = arg(&args, "--name").unwrap_or_else(|| "default".to_string());

    if !email.contains('@') {
        anyhow::bail!("'{}' is not an email address", email);
    }

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = db::connect(&database_url, 2).await?;

    if !db::check_schema(&pool).await? {
        db::run_migrations(&pool).await?;
    }

    let users = UserRepository::new(pool.clone());
    let user = users.find_or_create_by_email(&email).await?;

    let raw_key = generate_key();
    let key_id = users.insert_api_key(user.id, &key_name, &raw_key).await?;

    println!("User:    {} ({})", user.email, user.id);
    println!("Key ID:  {}", key_id);
    println!("API key: {}", raw_key);
    println!();
    println!("Store this key now; it is not recoverable.");

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_shape() {
        let key = generate_key();
        assert!(key.starts_with(KEY_PREFIX));
        assert_eq!(key.len(), KEY_PREFIX.len() + 64);
        assert_ne!(key, generate_key());
    }

    #[test]
    fn test_arg_lookup() {
        let args: Vec<String> = ["issue_key", "--email", "a@b.c"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(arg(&args, "--email").as_deref(), Some("a@b.c"));
        assert_eq!(arg(&args, "--name"), None);
    }
}
