use super::ServerArgs;
use crate::output::{print_json, print_table};

pub fn run(server: ServerArgs, json: bool) -> anyhow::Result<()> {
    let mut approvals = server.client().list()?;
    approvals.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    if json {
        return print_json(&approvals);
    }
    if approvals.is_empty() {
        println!("No approvals for '{}'.", server.org_id);
        return Ok(());
    }

    let rows = approvals
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.status.to_string(),
                a.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                a.message.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "CREATED", "MESSAGE"], rows);
    Ok(())
}
