use rs_ngram_core::model::evaluator;
use rs_ngram_core::model::generator::Generator;
use rs_ngram_core::model::ngram_model::NGramModel;
use rs_ngram_core::model::tokenizer::Tokenizer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Lowercase letters plus the newline sentinel, 27 tokens in total
    let tokenizer = Tokenizer::lowercase();

    // Trigram model with light add-k smoothing.
    // The first run counts the corpus (in parallel) and caches the model
    // next to it as ./data/names.bin; later runs load the cache directly.
    let model = NGramModel::load_or_train("./data/names.txt", &tokenizer, 3, 0.1)?;
    println!("Model ready: {} windows counted", model.count_total());

    // Generate 10 names with a fixed seed; rerunning reproduces them exactly
    let mut generator = Generator::new(1337, 100);
    for i in 0..10 {
        println!("Generated name {}: {}", i + 1, generator.generate(&model, &tokenizer)?);
    }

    // Score the model on the corpus it was trained on
    let metrics = evaluator::evaluate_file(&model, &tokenizer, "./data/names.txt")?;
    println!("Mean NLL: {:.4}", metrics.mean_nll);
    println!("Perplexity: {:.4}", metrics.perplexity);

    Ok(())
}
