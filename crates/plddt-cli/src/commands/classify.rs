use crate::cli::ClassifyArgs;
use crate::error::{CliError, Result};
use plddtpaint::core::confidence::{BinThresholds, is_catalytic};
use tracing::debug;

/// Renders one line per score: the score, its bin and the bin's label.
pub fn render(args: &ClassifyArgs) -> Result<Vec<String>> {
    if !args.cutoff.is_finite() {
        return Err(CliError::Argument(format!(
            "Catalytic cutoff must be finite, got {}",
            args.cutoff
        )));
    }
    let thresholds = BinThresholds::default();
    let mut lines: Vec<String> = args
        .scores
        .iter()
        .map(|&score| match thresholds.classify(score, args.rule) {
            Some(bin) => format!(
                "{:?}\t{}\t{}",
                score,
                bin,
                bin.label(&thresholds, args.rule)
            ),
            None => format!("{:?}\tunclassified\t-", score),
        })
        .collect();

    if let Some(marker) = args.marker {
        let verdict = if is_catalytic(marker, args.cutoff) {
            "catalytic"
        } else {
            "not catalytic"
        };
        lines.push(format!("q={:?}\t{} (q > {:?})", marker, verdict, args.cutoff));
    }
    debug!("Classified {} score(s) with the {} rule.", args.scores.len(), args.rule);
    Ok(lines)
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    for line in render(&args)? {
        println!("{}", line);
    }
    Ok(())
}
