fn main() {
    uniffi::generate_scaffolding("src/quickstart.udl").expect("failed to generate UniFFI scaffolding");
}
