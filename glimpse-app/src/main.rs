fn main() -> anyhow::Result<()> {
    glimpse_app::run()
}
