use pokeslot_core::{GeneratorConfig, OutcomeGenerator, ProvablyFairRng};

fn main() {
    // Example provably-fair spin
    let server_seed = "example-server-seed";
    let client_seed = "example-client-seed";
    let nonce = 1u64;
    let rng = ProvablyFairRng::new(server_seed, client_seed, nonce);
    let mut generator = OutcomeGenerator::new(GeneratorConfig::default(), rng.stream())
        .expect("default config is valid");
    let outcome = generator.generate();
    println!(
        "server_seed_hash={} board={:?} small={} big={} bonus={}",
        rng.server_seed_hash_hex(),
        outcome.board().rows(),
        outcome.small_win(),
        outcome.big_win(),
        outcome.bonus()
    );
}
