use super::domain::LeadRecord;

const HEADERS: [&str; 11] = [
    "ID",
    "First Name",
    "Last Name",
    "Email",
    "Phone",
    "Investment",
    "Source",
    "Status",
    "Notes",
    "Created At",
    "Updated At",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("export produced invalid utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Renders the admin CSV export with one row per lead, in the order given.
pub fn render_csv(leads: &[LeadRecord]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for lead in leads {
        writer.write_record([
            lead.id.0.to_string(),
            lead.first_name.clone(),
            lead.last_name.clone(),
            lead.email.clone(),
            lead.phone.clone(),
            lead.investment.clone(),
            lead.source.clone(),
            lead.status.label().to_string(),
            lead.notes.clone(),
            lead.created_at.format(TIMESTAMP_FORMAT).to_string(),
            lead.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}
