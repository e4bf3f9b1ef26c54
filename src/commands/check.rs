use anyhow::Result;

use stagehand::application::CheckUseCase;
use stagehand::presentation::output::{check_json, render_check_report, write_event};

use super::Session;

pub fn cmd_check(session: &Session, strict_warnings: bool) -> Result<i32> {
    let result = CheckUseCase::new(&session.config).execute(&session.project_root);

    if session.ui.json {
        let mut out = std::io::stdout().lock();
        write_event(&mut out, &check_json(&result, strict_warnings))?;
    } else {
        print!(
            "{}",
            render_check_report(&result, session.ui.color, session.ui.unicode)
        );
    }

    let has_issues = if strict_warnings {
        result.errors > 0 || result.warnings > 0
    } else {
        result.errors > 0
    };
    Ok(if has_issues { 1 } else { 0 })
}
