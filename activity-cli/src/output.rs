use activity_core::serde_utils::to_pretty_json;
use activity_protocol::access::UserProfile;
use activity_protocol::timeline::TimelineEntry;
use activity_timeline::RegenerationReport;
use colored::*;

pub fn print_user_progress(user: &UserProfile) {
    println!("User: {}", user.date_joined);
}

pub fn print_regeneration_report(report: &RegenerationReport) {
    println!(
        "{} {} users, {} rows in {} batches",
        "✔ Timelines regenerated:".green().bold(),
        report.users.to_string().bold(),
        report.rows,
        report.batches
    );
}

pub fn print_feed(entries: &[TimelineEntry]) -> anyhow::Result<()> {
    println!("{}", to_pretty_json(&entries)?);
    Ok(())
}

pub fn print_refusal(message: &str) {
    eprintln!("{} {}", "✘".red().bold(), message);
}
