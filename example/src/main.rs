// example/src/main.rs

use protolith::{compile_schema, schema_to_json, ProtoError, Record, Value};

const SCHEMA: &str = r#"
enum PhoneType {
    MOBILE = 0;
    HOME = 1;
}

message Person {
    required string name = 1;
    optional int32 age = 2 [default = 0];
    repeated string email = 3;
    message PhoneNumber {
        required string number = 1;
        optional PhoneType type = 2 [default = HOME];
    }
    repeated PhoneNumber phone = 4;
}
"#;

fn main() -> Result<(), ProtoError> {
    let (flat, codec) = compile_schema(SCHEMA)?;

    println!("Flat schema:\n{}", schema_to_json(&flat));

    // Build a Person record with one phone number and no age.
    let mut phone = Record::new("PhoneNumber");
    phone.set("number", Value::Str("555-0100".to_string()));

    let mut person = Record::new("Person");
    person.set("name", Value::Str("Ada".to_string()));
    person.set(
        "email",
        Value::Array(vec![Value::Str("ada@example.com".to_string())]),
    );
    person.set("phone", Value::Array(vec![Value::Message(phone)]));

    let bytes = codec.encode("Person", &person)?;
    println!("Encoded {} byte(s)", bytes.len());

    let decoded = codec.decode("Person", &bytes)?;
    println!("name  = {:?}", decoded.get("name"));
    println!("age   = {:?}", decoded.get("age")); // filled from the default
    println!("email = {:?}", decoded.get("email"));

    if let Some(phones) = decoded.get("phone") {
        for (i, entry) in phones.as_array().iter().enumerate() {
            if let Some(record) = entry.as_record() {
                println!(
                    "phone[{}] = {:?} (type {:?})",
                    i,
                    record.get("number"),
                    record.get("type")
                );
            }
        }
    }

    Ok(())
}
