//! Countdown command implementation

use slerfhub::tracker::ResetCountdown;

/// Print time left until the next daily and weekly reset
pub fn countdown_command() {
    let countdown = ResetCountdown::at(chrono::Local::now().naive_local());
    println!("Daily missions reset in:  {}", countdown.daily);
    println!("Weekly quests reset in:   {}", countdown.weekly);
}
