use matstage::invariant_sig::{count_signals, SIG_COMBINE_APPLIED, SIG_COMBINE_RETRIED};
use matstage::pipeline::{PayloadMode, Pipeline};

fn main() {
    // Random shapes: some pairs won't multiply, and the consumer compensates
    // by discarding the second operand and fetching a replacement.
    let pipeline = Pipeline::builder()
        .capacity(3)
        .target(50)
        .payload(PayloadMode::Random)
        .seed(7)
        .build()
        .unwrap();

    let report = pipeline.run();
    println!("{}", report);

    let counts = count_signals(&report.consumer_signals);
    println!(
        "multiplies applied: {}, operands discarded and replaced: {}",
        counts[SIG_COMBINE_APPLIED as usize],
        counts[SIG_COMBINE_RETRIED as usize],
    );
}
