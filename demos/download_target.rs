use climate_pdfs::ClimatePdfs;
use std::env;

fn main() {
    let client = ClimatePdfs::new();
    for url in env::args().skip(1) {
        let target = client.download_target().url(&url).call();
        println!("{} -> {}", url, target);
    }
}
