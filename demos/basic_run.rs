use matstage::matrix::Matrix;
use matstage::pipeline::{PayloadMode, Pipeline};

fn main() {
    // Stage ten 3x3 payloads through a four-slot buffer.
    let pipeline = Pipeline::builder()
        .capacity(4)
        .target(10)
        .payload(PayloadMode::FixedSize(3))
        .seed(42)
        .build()
        .unwrap();

    let report = pipeline.run();
    println!("{}", report);
    println!("balanced: {}", report.is_balanced());

    // Show what one multiply looks like on its own.
    let a = Matrix::filled(3, 3, 2);
    let b = Matrix::filled(3, 3, 1);
    let product = a.multiply(&b).unwrap();
    println!("\nsample product:\n{}", product);
}
