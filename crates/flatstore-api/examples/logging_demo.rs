use flatstore::logging::LogConfig;
use flatstore::{FieldValues, Store};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Debug level shows every insert, fetch and delete; use trace() for key-set rewrites
    let _guard = LogConfig::debug().init()?;

    println!("=== FlatStore Logging Demo ===\n");

    let dir = std::env::temp_dir().join("flatstore_logging_demo");
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }

    // Logs "Created store catalog"
    let store = Store::open(dir.join("demo.estore"))?;

    println!("\n1. Creating a sub-store...");
    let users = store.create_sub_store("users", &["id[pk]", "login"])?;

    println!("\n2. Inserting records...");
    users.insert_one(&[], &FieldValues::new().with("login", "alice"))?;
    users.insert_one(&[], &FieldValues::new().with("login", "bob"))?;

    println!("\n3. Reading records...");
    if let Some(user) = users.get_one(&FieldValues::new().with("id", 2))? {
        println!("Found: {}", user);
    }

    println!("\n4. Rejected insert...");
    if let Err(e) = users.insert_one(&[], &FieldValues::new().with("id", 1)) {
        println!("Error: {}", e);
    }

    println!("\n5. Deleting...");
    users.delete_one(&FieldValues::new().with("login", "alice"))?;

    println!("\n=== Demo Complete ===");
    println!("Check the logs above to see tracing output!");

    Ok(())
}
