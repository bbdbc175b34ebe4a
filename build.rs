fn main() {
    // Host builds (tests, fuzzing) have nothing to generate; the ESP-IDF
    // environment is only exported for firmware builds.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
