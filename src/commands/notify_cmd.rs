use super::load_settings_or_exit;
use sensorhub::notify::create_sender;
use std::error::Error;

pub async fn execute(body: String) -> Result<(), Box<dyn Error>> {
    let settings = load_settings_or_exit();
    let sender = create_sender(&settings)?;
    let receipt = sender.send(&body).await?;
    println!("{} ({})", receipt.sid, receipt.status);
    Ok(())
}
