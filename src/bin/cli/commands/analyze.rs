use std::path::Path;

use super::read_image_as_data_url;
use crate::client::LostFoundClient;
use crate::output::{self, OutputConfig};

/// Sends a photo for tagging and prints the result
pub async fn execute(
    client: &LostFoundClient,
    path: &Path,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = read_image_as_data_url(path)?;
    let analysis = client.analyze_image(image).await?;
    output::print_analysis(&analysis, config);
    Ok(())
}
