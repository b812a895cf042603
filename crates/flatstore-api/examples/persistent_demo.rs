//! Demonstrates FlatStore's on-disk catalog and sub-stores.
//!
//! Run with: cargo run -p flatstore --example persistent_demo

use flatstore::{FieldValues, Store, Value};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = "./demo_flatstore";
    let catalog = format!("{}/school.estore", data_dir);

    println!("=== FlatStore Persistent Demo ===\n");

    // Clean up any previous demo data
    if Path::new(data_dir).exists() {
        std::fs::remove_dir_all(data_dir)?;
        println!("🧹 Cleaned up previous demo data\n");
    }

    // PART 1: Write data
    println!("📝 PART 1: Creating sub-stores and inserting records...");
    {
        let store = Store::open(&catalog)?;
        let students = store.create_sub_store("students", &["student_id[pk]", "name", "surname"])?;
        let labs = store.create_sub_store_from_str("labs", "lab_id[pk] student subject mark")?;

        students.insert_one(&[], &FieldValues::new().with("name", "dan").with("surname", "kolo"))?;
        students.insert_one(&[], &FieldValues::new().with("name", "kadim").with("surname", "varpov"))?;
        students.insert_one(&[Value::from(10), "kadim".into(), "karpov".into()], &FieldValues::new())?;

        labs.insert_one(&[], &FieldValues::new().with("student", "1").with("subject", "math").with("mark", "A"))?;
        labs.insert_one(&[], &FieldValues::new().with("student", "2").with("subject", "math").with("mark", "C"))?;

        println!("   ✅ Sub-stores: {:?}", store.list()?);
        println!("   📁 Data written to: {}", data_dir);
    }

    // PART 2: Reopen and read
    println!("\n📖 PART 2: Reopening the catalog...");
    {
        let store = Store::open(&catalog)?;
        let students = store.get_sub_store("students")?;
        println!("   spec: {:?}", students.spec()?);

        for student in students.get_many(&FieldValues::new().with("name", "kadim"))? {
            println!("   {}", student);
        }

        // Keys are never reused: the next auto key follows the highest one
        students.insert_one(&[], &FieldValues::new().with("name", "max").with("surname", "li"))?;
        let max = students.get_one(&FieldValues::new().with("name", "max"))?;
        println!("   auto key for max: {:?}", max.and_then(|r| r.text("student_id")));
    }

    // PART 3: Delete
    println!("\n🗑  PART 3: Deleting...");
    {
        let store = Store::open(&catalog)?;
        let labs = store.get_sub_store("labs")?;
        let removed = labs.delete_one(&FieldValues::new().with("subject", "math"))?;
        println!("   removed {} record(s), {} left", removed, labs.get_all()?.len());
        println!("   key sets: {:?}", labs.meta()?.key_sets);
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
