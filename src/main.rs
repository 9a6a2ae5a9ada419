fn main() -> anyhow::Result<()> {
    quasselo_lib::run()
}
