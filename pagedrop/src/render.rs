//! User-facing text for command results. Everything here goes to stdout; diagnostics go
//! through `tracing` on stderr.

use pagedrop_core::contract::{DeleteReceipt, Identity, Site, SiteStatus};
use pagedrop_core::publish::PublishReport;
use std::fmt::Write;

pub fn publish_report(verb: &str, report: &PublishReport) -> String {
    let mut out = String::new();
    let summary = report.plan.summary();

    if report.plan.dry_run {
        let _ = writeln!(
            out,
            "Dry run: {verb} '{}' (nothing was changed)",
            report.project_name
        );
    } else {
        match &report.site {
            Some(site) => {
                let _ = writeln!(out, "{verb} '{}' at {}", report.project_name, site.url);
            }
            None => {
                let _ = writeln!(out, "{verb} '{}'", report.project_name);
            }
        }
    }
    let _ = writeln!(
        out,
        "  {} new, {} changed, {} unchanged, {} removed",
        summary.to_upload, summary.to_update, summary.unchanged, summary.deleted
    );

    if report.plan.dry_run {
        for (marker, paths) in [
            ('+', &report.plan.to_upload),
            ('~', &report.plan.to_update),
            ('-', &report.plan.deleted),
        ] {
            for path in paths {
                let _ = writeln!(out, "    {marker} {path}");
            }
        }
    } else if !report.uploads.is_empty() {
        let _ = writeln!(
            out,
            "  {} of {} file(s) uploaded",
            report.uploaded_count(),
            report.uploads.len()
        );
    }

    let failed: Vec<_> = report.failed_uploads().collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "Warning: {} file(s) failed to upload:", failed.len());
        for upload in failed {
            let _ = writeln!(
                out,
                "  {}: {}",
                upload.path,
                upload.error.as_deref().unwrap_or("unknown error")
            );
        }
        let _ = writeln!(out, "Re-run `pagedrop sync` to retry them.");
    }

    if !report.has_content {
        let _ = writeln!(
            out,
            "Warning: no markdown files found; the site will have no pages."
        );
    }

    if let Some(convergence) = &report.convergence {
        if convergence.timed_out {
            let _ = writeln!(
                out,
                "Warning: timed out waiting for processing; still pending: {}",
                convergence.pending.join(", ")
            );
        } else if convergence.errors.is_empty() {
            let _ = writeln!(out, "Processing complete.");
        }
        if !convergence.errors.is_empty() {
            let _ = writeln!(
                out,
                "Processing failed for {} file(s):",
                convergence.errors.len()
            );
            for failure in &convergence.errors {
                let _ = writeln!(out, "  {}: {}", failure.path, failure.detail);
            }
        }
    }
    out
}

pub fn identity(identity: &Identity) -> String {
    match &identity.email {
        Some(email) => format!("Logged in as {} <{email}>\n", identity.username),
        None => format!("Logged in as {}\n", identity.username),
    }
}

pub fn sites(sites: &[Site]) -> String {
    if sites.is_empty() {
        return "No sites yet. Publish one with `pagedrop publish <path>`.\n".to_string();
    }
    let width = sites
        .iter()
        .map(|s| s.project_name.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for site in sites {
        let files = site
            .file_count
            .map(|n| format!("  ({n} files)"))
            .unwrap_or_default();
        let _ = writeln!(out, "{:<width$}  {}{files}", site.project_name, site.url);
    }
    out
}

pub fn site_status(site: &Site, status: &SiteStatus) -> String {
    let counts = status.counts();
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", site.project_name, site.url);
    let _ = writeln!(
        out,
        "  {} file(s): {} ready, {} pending, {} failed",
        counts.total, counts.success, counts.pending, counts.error
    );
    for entry in status.files.iter().filter(|f| f.error.is_some()) {
        let _ = writeln!(
            out,
            "  {}: {}",
            entry.path,
            entry.error.as_deref().unwrap_or_default()
        );
    }
    out
}

pub fn deleted(site: &Site, receipt: &DeleteReceipt) -> String {
    format!(
        "Deleted '{}' ({} file(s) removed)\n",
        site.project_name, receipt.deleted_files
    )
}
