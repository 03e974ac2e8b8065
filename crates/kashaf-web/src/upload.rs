use axum::extract::Multipart;

/// An uploaded document with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Parsed form fields from the multipart upload.
pub struct FormFields {
    pub document: UploadedFile,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Parse a multipart form upload into structured form fields.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<FormFields, String> {
    let mut document: Option<UploadedFile> = None;
    let mut api_key: Option<String> = None;
    let mut model: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "document" => {
                let filename = field.file_name().unwrap_or("upload.docx").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?
                    .to_vec();
                if !data.is_empty() {
                    document = Some(UploadedFile { filename, data });
                }
            }
            "api_key" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read api_key: {}", e))?;
                if !val.trim().is_empty() {
                    api_key = Some(val.trim().to_string());
                }
            }
            "model" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read model: {}", e))?;
                if !val.trim().is_empty() {
                    model = Some(val.trim().to_string());
                }
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    let document = document.ok_or("No document uploaded")?;

    Ok(FormFields {
        document,
        api_key,
        model,
    })
}
