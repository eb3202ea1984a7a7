#[actix_web::main]
async fn main() -> std::io::Result<()> {
    promopro_docs::run().await
}
