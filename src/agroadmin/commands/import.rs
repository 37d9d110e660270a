use crate::commands::{CmdMessage, CmdResult};
use crate::config::AdminConfig;
use crate::error::Result;
use crate::import::import_contacts;
use crate::model::LifecycleRecord;
use crate::store::RecordStore;
use std::path::Path;

pub fn run<S: RecordStore>(store: &mut S, config: &AdminConfig, path: &Path) -> Result<CmdResult> {
    let summary = import_contacts(
        store,
        path,
        &config.contacts_table,
        &config.companies_table,
    )?;

    let mut result = CmdResult::default();
    for company in &summary.unmatched_companies {
        result.add_message(CmdMessage::warning(format!(
            "Company not found: {} (left unlinked, noted on the contact)",
            company
        )));
    }
    if summary.skipped > 0 {
        result.add_message(CmdMessage::info(format!(
            "Skipped {} row(s) without a name or email",
            summary.skipped
        )));
    }
    result.add_message(CmdMessage::success(format!(
        "Imported {} contact(s) from {}",
        summary.inserted.len(),
        path.display()
    )));

    result.affected_records = summary
        .inserted
        .iter()
        .filter_map(|row| LifecycleRecord::from_row(row).ok())
        .collect();
    result.imported_rows = summary.inserted;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::memory::MemoryStore;

    #[test]
    fn reports_unmatched_companies_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contatos.csv");
        std::fs::write(&path, "Nome;Empresa;Telefone\nAna;Fazenda Boa Vista;1\n;;2\n").unwrap();

        let mut store = MemoryStore::new()
            .with_table(
                "contacts",
                &["id", "name", "email", "phone", "role", "company_id", "notes", "created_at"],
            )
            .with_table("companies", &["id", "name"]);

        let result = run(&mut store, &AdminConfig::default(), &path).unwrap();
        assert_eq!(result.imported_rows.len(), 1);
        assert_eq!(result.affected_records.len(), 1);
        assert!(matches!(result.messages[0].level, MessageLevel::Warning));
        assert!(result.messages[0].content.contains("Fazenda Boa Vista"));
        assert!(result.messages[1].content.contains("Skipped 1 row"));
        assert!(result.messages[2].content.starts_with("Imported 1 contact(s)"));
    }
}
