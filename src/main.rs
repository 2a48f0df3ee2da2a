fn main() {
    gestmed_lib::run()
}
