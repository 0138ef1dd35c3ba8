use tournament_persistence_sqlite::{
    create_db_pool, init_schema, matches::SqliteMatchRepository, users::SqliteUserRepository,
};
use tournament_server_app::domain::user::{NewUser, Role, User, UserRepository};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 && args.len() != 5 {
        eprintln!("Usage: add_match <tournament name> <player a email> <player b email> [<referee email>]");
        std::process::exit(1);
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://tournament.db".to_string());
    let pool = create_db_pool(&database_url).expect("Invalid DATABASE_URL");
    init_schema(&pool).await.expect("Failed to create schema");

    let users = SqliteUserRepository::new(pool.clone());
    let matches = SqliteMatchRepository::new(pool);

    let player_a = ensure_user(&users, &args[2], Role::Player).await;
    let player_b = ensure_user(&users, &args[3], Role::Player).await;
    let referee = match args.get(4) {
        Some(email) => Some(ensure_user(&users, email, Role::Referee).await),
        None => None,
    };
    if let Some(referee) = &referee {
        if referee.role != Role::Referee {
            eprintln!(
                "Warning: [{}] already exists with role {} and cannot referee",
                referee.email, referee.role
            );
        }
    }

    let tournament_id = matches
        .create_tournament(&args[1])
        .await
        .expect("Failed to create tournament");
    let match_id = matches
        .create_match(
            tournament_id,
            player_a.id,
            player_b.id,
            referee.as_ref().map(|r| r.id),
        )
        .await
        .expect("Failed to create match");

    println!(
        "Created match [{}] in tournament [{}]: {} vs {}",
        match_id, args[1], player_a.full_name, player_b.full_name
    );
}

async fn ensure_user(users: &SqliteUserRepository, email: &str, role: Role) -> User {
    let full_name = email.split('@').next().unwrap_or(email).to_string();
    let user = users
        .find_or_create_user(NewUser {
            email: email.to_string(),
            full_name,
            provider_id: String::new(),
            role,
        })
        .await
        .expect("Failed to create user");
    println!("User [{}] has id [{}] and role {}", user.email, user.id, user.role);
    user
}
