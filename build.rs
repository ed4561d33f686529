fn main() {
    // ESP-IDF build environment passthrough; a no-op for host targets.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
