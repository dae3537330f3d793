use rand::distributions::Alphanumeric;
use rand::Rng;
use shared::ClientId;

/// Length of generated client identities.
pub const CLIENT_ID_LEN: usize = 9;

/// Draws a short alphanumeric identity not rejected by `in_use`.
pub fn generate_client_id<R: Rng>(rng: &mut R, in_use: impl Fn(&ClientId) -> bool) -> ClientId {
    loop {
        let id: String = (0..CLIENT_ID_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)))
            .collect();
        let id = ClientId(id);
        if !in_use(&id) {
            return id;
        }
    }
}
