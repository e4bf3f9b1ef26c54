use anyhow::Result;

use stagehand::domain::services::StageGraph;
use stagehand::presentation::output::{plan_json, render_plan, write_event};

use super::Session;

pub fn cmd_plan(session: &Session) -> Result<i32> {
    let graph = StageGraph::standard();
    let waves = graph.waves()?;
    let layout = session.config.project_layout();
    let image = session.config.image_dir(&session.project_root);

    if session.ui.json {
        let mut out = std::io::stdout().lock();
        write_event(&mut out, &plan_json(&graph, &waves, &layout, &image))?;
    } else {
        print!("{}", render_plan(&graph, &waves, &layout, &image, session.ui.color));
    }
    Ok(0)
}
