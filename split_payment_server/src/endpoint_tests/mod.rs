mod helpers;
mod mocks;
mod signatures;
mod webhooks;
