use crate::license::LicenseRecord;

/// The sample inventory shown when no licenses file is configured.
pub fn demo_licenses() -> Vec<LicenseRecord> {
    vec![
        sample(
            "1",
            "Microsoft Office 365",
            "Microsoft",
            "XXXXX-XXXXX-XXXXX-12345",
            "2024-12-31",
            "Enterprise license for 500 users",
            "IT",
            "Productivity",
        ),
        sample(
            "2",
            "Adobe Creative Suite",
            "Adobe",
            "XXXXX-XXXXX-XXXXX-67890",
            "2024-08-15",
            "Design team license",
            "Marketing",
            "Design",
        ),
        sample(
            "3",
            "Slack Pro",
            "Slack Technologies",
            "XXXXX-XXXXX-XXXXX-11111",
            "2024-06-30",
            "Team communication platform",
            "IT",
            "Communication",
        ),
        sample(
            "4",
            "JetBrains IntelliJ IDEA",
            "JetBrains",
            "XXXXX-XXXXX-XXXXX-22222",
            "2025-03-15",
            "Development team IDE licenses",
            "Engineering",
            "Development",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    product_name: &str,
    vendor: &str,
    license_key: &str,
    expiry_date: &str,
    notes: &str,
    department: &str,
    category: &str,
) -> LicenseRecord {
    LicenseRecord {
        id: id.to_string(),
        product_name: product_name.to_string(),
        vendor: vendor.to_string(),
        license_key: license_key.to_string(),
        expiry_date: expiry_date.to_string(),
        notes: Some(notes.to_string()),
        department: Some(department.to_string()),
        category: Some(category.to_string()),
    }
}
