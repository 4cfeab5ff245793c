use serde::Serialize;

use crate::jira::CreatedIssue;
use crate::relay::{IssueTracker, SourceCrm};

/// Per-file outcome of copying a deal's files onto the new issue. A file
/// listed without a name is reported as `file <id>`.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct AttachmentReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<String>,
}

/// Copies every file attached to the deal onto `issue`, one at a time and in
/// listing order. Failures are logged and recorded; they never abort the loop.
pub async fn relay_attachments<C, T>(
    deal_id: &str,
    issue: &CreatedIssue,
    crm: &C,
    tracker: &T,
) -> AttachmentReport
where
    C: SourceCrm,
    T: IssueTracker,
{
    let mut report = AttachmentReport::default();

    let files = match crm.list_deal_files(deal_id).await {
        Ok(files) => files,
        Err(e) => {
            log::warn!("Could not list files of deal {}: {}", deal_id, e);
            return report;
        }
    };

    if files.is_empty() {
        log::debug!("Deal {} has no files", deal_id);
        return report;
    }
    log::info!("Relaying {} file(s) from deal {} to {}", files.len(), deal_id, issue.key);

    for file in files {
        let (Some(file_id), Some(file_name)) = (file.id(), file.file_name()) else {
            log::warn!("Skipping file without id or name: {:?}", file);
            match (file.file_name(), file.id()) {
                (Some(name), _) => report.failed.push(name.to_string()),
                (None, Some(id)) => report.failed.push(format!("file {id}")),
                (None, None) => {}
            }
            continue;
        };

        let content = match crm.download_file(&file_id).await {
            Ok(content) if !content.is_empty() => content,
            Ok(_) => {
                log::warn!("File {} ({}) is empty; skipping", file_id, file_name);
                report.failed.push(file_name.to_string());
                continue;
            }
            Err(e) => {
                log::warn!("Could not download file {} ({}): {}", file_id, file_name, e);
                report.failed.push(file_name.to_string());
                continue;
            }
        };

        match tracker.upload_attachment(&issue.key, file_name, content).await {
            Ok(()) => {
                log::info!("Attached {} to {}", file_name, issue.key);
                report.uploaded.push(file_name.to_string());
            }
            Err(e) => {
                log::warn!("Could not attach {} to {}: {}", file_name, issue.key, e);
                report.failed.push(file_name.to_string());
            }
        }
    }

    report
}
