use crate::db::*;
use tempfile::NamedTempFile;

mod close;
mod migrations;

/// Fresh database with one project named `project`
///
/// The temp file must outlive the database, so both are returned.
pub(super) async fn db_with_project(project: &str) -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    db.add_project(project).await.unwrap();
    (db, temp_file)
}

pub(super) fn new_sub(root_domain: &str, subdomain: &str) -> NewSubdomain {
    NewSubdomain {
        root_domain: root_domain.to_string(),
        subdomain: subdomain.to_string(),
    }
}

pub(super) fn names(subs: &[Subdomain]) -> Vec<&str> {
    subs.iter().map(|s| s.subdomain.as_str()).collect()
}
