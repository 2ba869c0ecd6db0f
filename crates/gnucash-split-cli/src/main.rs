fn main() -> anyhow::Result<()> {
    gnucash_split_cli::run(std::env::args())
}
