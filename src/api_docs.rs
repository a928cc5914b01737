use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::create_book,
        api::books::create_edition,
        api::ratings::get_book_rating,
        api::reviews::list_book_reviews,
        api::reviews::rate_edition,
        api::reviews::delete_review,
        api::votes::vote,
        api::votes::vote_counts,
        api::votes::my_votes,
    ),
    components(
        schemas(
            api::books::CreateBookRequest,
            api::books::CreateEditionRequest,
            api::reviews::RateRequest,
            api::votes::VoteRequest,
            api::votes::ReviewIdsRequest,
        )
    ),
    tags(
        (name = "bibliorate", description = "Book rating and review vote API")
    )
)]
pub struct ApiDoc;
