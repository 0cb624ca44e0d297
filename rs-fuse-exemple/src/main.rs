use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rs_fuse_core::metrics::{end_to_end, levmetric};
use rs_fuse_core::{
    Alignment, AlignmentWithEstimation, Cell, FusionInput, ListSequence, SequenceStructure, StructureKind,
    TreapSequence,
};

/// Text every simulated recognition pass tries to read
const TRUTH: &str = "COMBINING RECOGNITION RESULTS";

/// Characters a noisy pass may substitute
const CONFUSIONS: &[char] = &['0', 'B', 'E', 'I', 'L', 'N', 'O', '8', '1'];

/// Simulated recognizer output: a certain cell per character, with some
/// characters dropped, replaced or doubled
fn noisy_pass(rng: &mut StdRng) -> String {
    let mut pass = String::new();
    for c in TRUTH.chars() {
        let roll: f64 = rng.random();
        if roll < 0.04 {
            // dropped
        } else if roll < 0.12 {
            pass.push(CONFUSIONS[rng.random_range(0..CONFUSIONS.len())]);
        } else if roll < 0.15 {
            pass.push(c);
            pass.push(c);
        } else {
            pass.push(c);
        }
    }
    pass
}

/// Same pass, but the recognizer hesitates between its answer and the letter
/// it most often confuses it with
fn probabilistic_pass(rng: &mut StdRng) -> Result<Vec<Cell>, Box<dyn std::error::Error>> {
    let mut cells = Vec::new();
    for c in noisy_pass(rng).chars() {
        let mut cell = Cell::certain(c);
        if c == 'O' {
            cell.set('0', 0.5)?;
        }
        cells.push(cell);
    }
    Ok(cells)
}

/// Feeds passes until the expected change drops below `threshold`
fn run_estimation<S: SequenceStructure>(
    input: &FusionInput,
    threshold: f64,
    max_passes: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(input.seed.unwrap_or(0));
    let mut estimator = AlignmentWithEstimation::<S>::new(input)?;

    for i in 0..max_passes {
        estimator.add_string(&noisy_pass(&mut rng))?;
        let result = estimator.get_string_result();
        let sum = estimator.get_modelling_sum();
        println!(
            "Pass {:>2}: {:<32} modelling sum {:.5}  levmetric {:.3}",
            i + 1,
            result,
            sum,
            levmetric(&result, TRUTH)
        );
        if i > 0 && sum < threshold {
            println!("Expected change below {} after {} passes", threshold, i + 1);
            break;
        }
    }

    let result = estimator.get_string_result();
    println!("Consensus: {} (end to end error: {})", result, end_to_end(&result, TRUTH));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows each merge
    env_logger::init();

    // A position is printed only if its best character outweighs
    // the gap weight times this factor
    let mut input = FusionInput::default().with_seed(2024);
    input.set_empty_weight(1.0)?;

    // Negative factors are rejected
    match input.set_empty_weight(-1.0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("{}", e),
    }

    // Weighted fusion: later passes come from a better recognizer
    let mut rng = StdRng::seed_from_u64(7);
    let mut alignment = Alignment::new(&input)?;
    for i in 0..8 {
        let weight = if i < 4 { 1.0 } else { 3.0 };
        alignment.add_string(&probabilistic_pass(&mut rng)?, weight)?;
    }
    info!("weighted fusion settled on {} cells", alignment.base().len());
    let result = alignment.get_string_result();
    println!("Weighted consensus: {} (total weight {})", result, alignment.base_weight());
    println!("Distance to truth: {:.3}", levmetric(&result, TRUTH));

    // Convergence estimation, exact then approximate
    for structure in [StructureKind::List, StructureKind::Treap] {
        println!("\n{:?} histories", structure);
        let input = input.clone().with_structure(structure);
        match input.structure {
            StructureKind::List => run_estimation::<ListSequence>(&input, 0.002, 40)?,
            StructureKind::Treap => run_estimation::<TreapSequence>(&input, 0.002, 40)?,
        }
    }

    Ok(())
}
