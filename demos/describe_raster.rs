//! Example: describing an in-memory raster and reading a resampled window

use rasterwin::{
    CollectingSink, DriverInfo, GeoTransform, MemoryBackend, MemoryBand, MemoryDataset,
    RasterReader, RequestOptions,
};

fn main() -> anyhow::Result<()> {
    println!("rasterwin v{}\n", rasterwin::RASTERWIN_VERSION);

    let (width, height) = (500, 600);
    let elevation: Vec<f32> = (0..width * height)
        .map(|i| ((i % width) + (i / width)) as f32 * 0.5)
        .collect();

    let band = MemoryBand::from_f32(width, height, elevation)?
        .with_no_data(-9999.0)
        .with_overview(MemoryBand::from_f32(250, 300, vec![0.0; 250 * 300])?);

    let dataset = MemoryDataset::new(vec![band])
        .with_driver(DriverInfo::new("GTiff", "GeoTIFF"))
        .with_projection("EPSG:32611")
        .with_geo_transform(GeoTransform::new([440720.0, 60.0, 0.0, 3751320.0, 0.0, -60.0]));

    let reader = RasterReader::new(MemoryBackend::new().with_dataset("dem.tif", dataset));
    let mut sink = CollectingSink::new();

    let metadata = reader.describe("dem.tif", false, &mut sink)?;
    println!("{}", metadata.summary());
    println!("{}\n", serde_json::to_string_pretty(&metadata.to_record()?)?);

    // Top-left quarter, downsampled by 10
    let options = RequestOptions::new()
        .with_window(0, 0, 250, 300)
        .with_output_size(25, 30);
    let pixels = reader.read_pixels("dem.tif", &options, &mut sink)?;

    let (rows, cols) = pixels.dims();
    println!("Read {}x{} window ({} bytes per sample)", rows, cols, pixels.element_size());
    println!("First sample: {:?}", pixels.get(0, 0));

    for trace in sink.traces() {
        println!("  {}", trace);
    }

    Ok(())
}
