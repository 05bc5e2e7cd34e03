use chrono::{Days, NaiveDate};
use dialoguer::{Confirm, Input, Select};

/// Ask whether today's consensus should be recorded as today's or yesterday's.
pub fn select_update_date(today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let yesterday = today - Days::new(1);
    let items = [
        format!("Today ({})", today.format("%A %Y-%m-%d")),
        format!("Yesterday ({})", yesterday.format("%A %Y-%m-%d")),
    ];

    let choice = Select::new()
        .with_prompt("Record the consensus as of")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match choice {
        0 => today,
        _ => yesterday,
    })
}

/// Ask for the first date to download; by default a week before the latest stored date, to
/// pick up any late revisions.
pub fn select_start_date(latest_stored: Option<NaiveDate>) -> anyhow::Result<NaiveDate> {
    if let Some(latest) = latest_stored {
        let week_before = latest - Days::new(7);
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Download from a week before the latest stored date ({week_before})?"
            ))
            .default(true)
            .interact()?;
        if confirmed {
            return Ok(week_before);
        }
    }

    input_date("Download start date (YYYY-MM-DD)")
}

/// Ask for the last date to download; by default today.
pub fn select_end_date(today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Download up to today ({today})?"))
        .default(true)
        .interact()?;

    match confirmed {
        true => Ok(today),
        false => input_date("Download end date (YYYY-MM-DD)"),
    }
}

fn input_date(prompt: &str) -> anyhow::Result<NaiveDate> {
    let date = Input::<NaiveDate>::new()
        .with_prompt(prompt)
        .interact_text()?;
    Ok(date)
}
